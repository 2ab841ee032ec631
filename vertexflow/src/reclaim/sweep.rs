//! Best-effort resource sweep.
//!
//! The reclaimer enumerates platform resources belonging to one application
//! and deletes them in the fixed dependency order of
//! [`SWEEP_ORDER`](super::phases::SWEEP_ORDER): jobs before the pipeline runs
//! that spawned them, endpoint undeployment before endpoint deletion. Nothing
//! here is transactional — a failure is logged, counted, and skipped, and the
//! sweep always runs to the end.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::phases::{PhaseSet, ReclaimPhase, SWEEP_ORDER};
use crate::config::PipelineConfig;
use crate::errors::Result;
use crate::platform::resources::{filter_by_prefix, ResourceSummary};
use crate::platform::services::{
    EndpointService, JobService, MetadataService, ModelService, PipelineService,
};

/// Outcome of one sweep phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseOutcome {
    /// Which phase this outcome describes.
    pub phase: ReclaimPhase,
    /// Resources deleted, including jobs spawned by pipeline runs.
    pub deleted: usize,
    /// Deletions (or the listing itself) that failed.
    pub failed: usize,
    /// Messages for every failure, in occurrence order.
    pub errors: Vec<String>,
}

impl PhaseOutcome {
    fn new(phase: ReclaimPhase) -> Self {
        Self {
            phase,
            deleted: 0,
            failed: 0,
            errors: Vec::new(),
        }
    }

    fn record_deleted(&mut self) {
        self.deleted += 1;
    }

    fn record_failure(&mut self, message: impl Into<String>) {
        self.failed += 1;
        self.errors.push(message.into());
    }
}

/// Aggregated outcome of a full sweep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepReport {
    /// Per-phase outcomes, in sweep order; skipped phases are absent.
    pub phases: Vec<PhaseOutcome>,
}

impl SweepReport {
    /// Total resources deleted across phases.
    #[must_use]
    pub fn total_deleted(&self) -> usize {
        self.phases.iter().map(|p| p.deleted).sum()
    }

    /// Total failures across phases.
    #[must_use]
    pub fn total_failed(&self) -> usize {
        self.phases.iter().map(|p| p.failed).sum()
    }

    /// Whether every attempted deletion succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.total_failed() == 0
    }

    /// Outcome for one phase, if it ran.
    #[must_use]
    pub fn phase(&self, phase: ReclaimPhase) -> Option<&PhaseOutcome> {
        self.phases.iter().find(|p| p.phase == phase)
    }
}

/// Sweeps an application's platform resources.
pub struct Reclaimer {
    config: PipelineConfig,
    jobs: Arc<dyn JobService>,
    models: Arc<dyn ModelService>,
    endpoints: Arc<dyn EndpointService>,
    pipelines: Arc<dyn PipelineService>,
    metadata: Arc<dyn MetadataService>,
}

impl Reclaimer {
    /// Creates a reclaimer over the given service handles.
    #[must_use]
    pub fn new(
        config: PipelineConfig,
        jobs: Arc<dyn JobService>,
        models: Arc<dyn ModelService>,
        endpoints: Arc<dyn EndpointService>,
        pipelines: Arc<dyn PipelineService>,
        metadata: Arc<dyn MetadataService>,
    ) -> Self {
        Self {
            config,
            jobs,
            models,
            endpoints,
            pipelines,
            metadata,
        }
    }

    /// Runs the selected phases in fixed dependency order.
    ///
    /// The sweep itself never fails; partial failure is visible in the
    /// returned report, and each phase is guarded independently so a bad
    /// resource never blocks cleanup of the rest.
    pub async fn sweep(&self, phases: &PhaseSet) -> SweepReport {
        let mut report = SweepReport::default();
        for phase in SWEEP_ORDER {
            if !phases.contains(phase) {
                continue;
            }
            info!(phase = phase.label(), app = %self.config.app_name, "sweeping phase");
            let outcome = match phase {
                ReclaimPhase::CustomJobs => self.sweep_custom_jobs().await,
                ReclaimPhase::TuningJobs => self.sweep_tuning_jobs().await,
                ReclaimPhase::Endpoints => self.sweep_endpoints().await,
                ReclaimPhase::Models => self.sweep_models().await,
                ReclaimPhase::PipelineRuns => self.sweep_pipeline_runs().await,
                ReclaimPhase::Artifacts => self.sweep_artifacts().await,
            };
            info!(
                phase = phase.label(),
                deleted = outcome.deleted,
                failed = outcome.failed,
                "phase finished"
            );
            report.phases.push(outcome);
        }
        report
    }

    /// Lists a resource kind and keeps only entries matching the app prefix.
    fn matching(&self, listed: Result<Vec<ResourceSummary>>) -> Result<Vec<ResourceSummary>> {
        listed.map(|summaries| filter_by_prefix(summaries, Some(&self.config.app_name)))
    }

    async fn sweep_custom_jobs(&self) -> PhaseOutcome {
        let mut outcome = PhaseOutcome::new(ReclaimPhase::CustomJobs);
        let listed = self.jobs.list_custom_jobs(&self.config.parent()).await;
        let jobs = match self.matching(listed) {
            Ok(jobs) => jobs,
            Err(err) => {
                warn!(error = %err, "listing custom jobs failed");
                outcome.record_failure(err.to_string());
                return outcome;
            }
        };
        for job in jobs {
            info!(job = %job.name, display_name = %job.display_name, "deleting custom job");
            match self.jobs.delete_custom_job(&job.name).await {
                Ok(()) => outcome.record_deleted(),
                Err(err) => {
                    warn!(job = %job.name, error = %err, "deleting custom job failed");
                    outcome.record_failure(err.to_string());
                }
            }
        }
        outcome
    }

    async fn sweep_tuning_jobs(&self) -> PhaseOutcome {
        let mut outcome = PhaseOutcome::new(ReclaimPhase::TuningJobs);
        let listed = self
            .jobs
            .list_hyperparameter_tuning_jobs(&self.config.parent())
            .await;
        let jobs = match self.matching(listed) {
            Ok(jobs) => jobs,
            Err(err) => {
                warn!(error = %err, "listing tuning jobs failed");
                outcome.record_failure(err.to_string());
                return outcome;
            }
        };
        for job in jobs {
            info!(job = %job.name, display_name = %job.display_name, "deleting tuning job");
            match self.jobs.delete_hyperparameter_tuning_job(&job.name).await {
                Ok(()) => outcome.record_deleted(),
                Err(err) => {
                    warn!(job = %job.name, error = %err, "deleting tuning job failed");
                    outcome.record_failure(err.to_string());
                }
            }
        }
        outcome
    }

    async fn sweep_endpoints(&self) -> PhaseOutcome {
        let mut outcome = PhaseOutcome::new(ReclaimPhase::Endpoints);
        let listed = self.endpoints.list_endpoints(&self.config.parent()).await;
        let endpoints = match self.matching(listed) {
            Ok(endpoints) => endpoints,
            Err(err) => {
                warn!(error = %err, "listing endpoints failed");
                outcome.record_failure(err.to_string());
                return outcome;
            }
        };
        for endpoint in endpoints {
            // undeploy must finish before the delete is safe; on undeploy
            // failure the delete is not attempted for this endpoint
            info!(endpoint = %endpoint.display_name, "undeploying all models");
            if let Err(err) = self.endpoints.undeploy_all(&endpoint.name).await {
                warn!(endpoint = %endpoint.name, error = %err, "undeploy failed, skipping delete");
                outcome.record_failure(err.to_string());
                continue;
            }
            info!(endpoint = %endpoint.name, display_name = %endpoint.display_name, "deleting endpoint");
            match self.endpoints.delete_endpoint(&endpoint.name).await {
                Ok(()) => outcome.record_deleted(),
                Err(err) => {
                    warn!(endpoint = %endpoint.name, error = %err, "deleting endpoint failed");
                    outcome.record_failure(err.to_string());
                }
            }
        }
        outcome
    }

    async fn sweep_models(&self) -> PhaseOutcome {
        let mut outcome = PhaseOutcome::new(ReclaimPhase::Models);
        let listed = self.models.list_models(&self.config.parent()).await;
        let models = match self.matching(listed) {
            Ok(models) => models,
            Err(err) => {
                warn!(error = %err, "listing models failed");
                outcome.record_failure(err.to_string());
                return outcome;
            }
        };
        for model in models {
            info!(model = %model.name, display_name = %model.display_name, "deleting model");
            match self.models.delete_model(&model.name).await {
                Ok(()) => outcome.record_deleted(),
                Err(err) => {
                    // a model still deployed elsewhere surfaces here as a
                    // plain remote failure
                    warn!(model = %model.name, error = %err, "deleting model failed");
                    outcome.record_failure(err.to_string());
                }
            }
        }
        outcome
    }

    async fn sweep_pipeline_runs(&self) -> PhaseOutcome {
        let mut outcome = PhaseOutcome::new(ReclaimPhase::PipelineRuns);
        let runs = match self
            .pipelines
            .list_pipeline_runs(&self.config.parent(), Some(self.config.pipeline_name.clone()))
            .await
        {
            Ok(runs) => runs,
            Err(err) => {
                warn!(error = %err, "listing pipeline runs failed");
                outcome.record_failure(err.to_string());
                return outcome;
            }
        };
        for run in runs {
            info!(run = %run, "deleting pipeline run");
            // spawned custom jobs go first; an unreadable run is skipped
            // without touching it
            let detail = match self.pipelines.get_pipeline_run(&run).await {
                Ok(detail) => detail,
                Err(err) => {
                    warn!(run = %run, error = %err, "fetching run detail failed, skipping run");
                    outcome.record_failure(err.to_string());
                    continue;
                }
            };
            for (task, job) in detail.spawned_jobs() {
                info!(run = %run, task = %task, job = %job, "deleting spawned custom job");
                match self.jobs.delete_custom_job(job).await {
                    Ok(()) => outcome.record_deleted(),
                    Err(err) => {
                        warn!(job = %job, error = %err, "deleting spawned custom job failed");
                        outcome.record_failure(err.to_string());
                    }
                }
            }
            match self.pipelines.delete_pipeline_run(&run).await {
                Ok(()) => outcome.record_deleted(),
                Err(err) => {
                    warn!(run = %run, error = %err, "deleting pipeline run failed");
                    outcome.record_failure(err.to_string());
                }
            }
        }
        outcome
    }

    async fn sweep_artifacts(&self) -> PhaseOutcome {
        let mut outcome = PhaseOutcome::new(ReclaimPhase::Artifacts);
        // lineage artifacts are swept unfiltered: every artifact in scope goes
        let artifacts = match self.metadata.list_artifacts(&self.config.parent()).await {
            Ok(artifacts) => artifacts,
            Err(err) => {
                warn!(error = %err, "listing artifacts failed");
                outcome.record_failure(err.to_string());
                return outcome;
            }
        };
        for artifact in artifacts {
            info!(artifact = %artifact.name, "deleting metadata artifact");
            match self.metadata.delete_artifact(&artifact.name).await {
                Ok(()) => outcome.record_deleted(),
                Err(err) => {
                    warn!(artifact = %artifact.name, error = %err, "deleting artifact failed");
                    outcome.record_failure(err.to_string());
                }
            }
        }
        outcome
    }
}
