//! Scenario tests for the resource sweep.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use crate::config::PipelineConfig;
use crate::errors::{Result, VertexflowError};
use crate::platform::resources::{
    CustomJobDetail, EndpointDetail, PipelineRunDetail, PredictRequest, PredictResponse,
    ResourceSummary,
};
use crate::platform::services::{
    EndpointService, JobService, MetadataService, MockEndpointService, MockJobService,
    MockMetadataService, MockModelService, MockPipelineService, ModelService, PipelineService,
};
use crate::reclaim::{PhaseSet, ReclaimPhase, Reclaimer};

/// In-memory platform that records every mutating call in order.
#[derive(Default)]
struct FakePlatform {
    custom_jobs: Vec<ResourceSummary>,
    tuning_jobs: Vec<ResourceSummary>,
    models: Vec<ResourceSummary>,
    endpoints: Vec<ResourceSummary>,
    endpoint_models: HashMap<String, Vec<String>>,
    runs: Vec<String>,
    run_details: HashMap<String, PipelineRunDetail>,
    artifacts: Vec<ResourceSummary>,
    fail_deletes: HashSet<String>,
    fail_undeploys: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FakePlatform {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn call_index(&self, call: &str) -> Option<usize> {
        self.calls().iter().position(|c| c == call)
    }

    fn delete(&self, call: String, name: &str) -> Result<()> {
        self.record(call);
        if self.fail_deletes.contains(name) {
            Err(VertexflowError::remote("fake", format!("{name} already gone")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl JobService for FakePlatform {
    async fn list_custom_jobs(&self, _parent: &str) -> Result<Vec<ResourceSummary>> {
        Ok(self.custom_jobs.clone())
    }

    async fn get_custom_job(&self, name: &str) -> Result<CustomJobDetail> {
        Ok(CustomJobDetail {
            name: name.to_string(),
            ..CustomJobDetail::default()
        })
    }

    async fn delete_custom_job(&self, name: &str) -> Result<()> {
        self.delete(format!("delete_custom_job {name}"), name)
    }

    async fn list_hyperparameter_tuning_jobs(&self, _parent: &str) -> Result<Vec<ResourceSummary>> {
        Ok(self.tuning_jobs.clone())
    }

    async fn delete_hyperparameter_tuning_job(&self, name: &str) -> Result<()> {
        self.delete(format!("delete_tuning_job {name}"), name)
    }
}

#[async_trait]
impl ModelService for FakePlatform {
    async fn list_models(&self, _parent: &str) -> Result<Vec<ResourceSummary>> {
        Ok(self.models.clone())
    }

    async fn delete_model(&self, name: &str) -> Result<()> {
        self.delete(format!("delete_model {name}"), name)
    }
}

#[async_trait]
impl EndpointService for FakePlatform {
    async fn list_endpoints(&self, _parent: &str) -> Result<Vec<ResourceSummary>> {
        Ok(self.endpoints.clone())
    }

    async fn get_endpoint(&self, name: &str) -> Result<EndpointDetail> {
        Ok(EndpointDetail {
            name: name.to_string(),
            ..EndpointDetail::default()
        })
    }

    async fn undeploy_all(&self, name: &str) -> Result<()> {
        for model in self.endpoint_models.get(name).into_iter().flatten() {
            self.record(format!("undeploy {name}/{model}"));
        }
        self.record(format!("undeploy_all {name}"));
        if self.fail_undeploys.contains(name) {
            Err(VertexflowError::remote("fake", "undeploy failed"))
        } else {
            Ok(())
        }
    }

    async fn delete_endpoint(&self, name: &str) -> Result<()> {
        self.delete(format!("delete_endpoint {name}"), name)
    }

    async fn predict(&self, _name: &str, _request: PredictRequest) -> Result<PredictResponse> {
        Ok(PredictResponse::default())
    }
}

#[async_trait]
impl PipelineService for FakePlatform {
    async fn list_pipeline_runs(
        &self,
        _parent: &str,
        display_name: Option<String>,
    ) -> Result<Vec<String>> {
        self.record(format!(
            "list_pipeline_runs filter={}",
            display_name.as_deref().unwrap_or("<none>")
        ));
        Ok(self.runs.clone())
    }

    async fn get_pipeline_run(&self, name: &str) -> Result<PipelineRunDetail> {
        self.run_details
            .get(name)
            .cloned()
            .ok_or_else(|| VertexflowError::remote("fake", format!("{name} not found")))
    }

    async fn delete_pipeline_run(&self, name: &str) -> Result<()> {
        self.delete(format!("delete_pipeline_run {name}"), name)
    }
}

#[async_trait]
impl MetadataService for FakePlatform {
    async fn list_artifacts(&self, _parent: &str) -> Result<Vec<ResourceSummary>> {
        Ok(self.artifacts.clone())
    }

    async fn delete_artifact(&self, name: &str) -> Result<()> {
        self.delete(format!("delete_artifact {name}"), name)
    }
}

fn demo_config() -> PipelineConfig {
    PipelineConfig::new("proj-1", "gs://mlops-builds", "demo")
        .with_pipeline_name("demo-pipeline")
        .with_version("20240101000000")
}

fn reclaimer(fake: &Arc<FakePlatform>) -> Reclaimer {
    Reclaimer::new(
        demo_config(),
        fake.clone(),
        fake.clone(),
        fake.clone(),
        fake.clone(),
        fake.clone(),
    )
}

fn run_detail(name: &str, tasks: &[(&str, Option<&str>)]) -> PipelineRunDetail {
    let task_details = tasks
        .iter()
        .map(|(task, job)| {
            serde_json::json!({
                "taskName": task,
                "executorDetail": job.map(|job| {
                    serde_json::json!({"containerDetail": {"mainJob": job}})
                }),
            })
        })
        .collect::<Vec<_>>();
    serde_json::from_value(serde_json::json!({
        "name": name,
        "displayName": "demo-pipeline",
        "jobDetail": {"taskDetails": task_details},
    }))
    .expect("run detail should build")
}

#[tokio::test]
async fn only_prefix_matching_jobs_are_deleted() {
    let fake = Arc::new(FakePlatform {
        custom_jobs: vec![
            ResourceSummary::new("projects/p/customJobs/1", "demo-run-1"),
            ResourceSummary::new("projects/p/customJobs/2", "other-run-2"),
        ],
        ..FakePlatform::default()
    });
    let report = reclaimer(&fake)
        .sweep(&PhaseSet::none().with(ReclaimPhase::CustomJobs))
        .await;

    assert_eq!(fake.calls(), vec!["delete_custom_job projects/p/customJobs/1"]);
    let outcome = report.phase(ReclaimPhase::CustomJobs).expect("phase ran");
    assert_eq!(outcome.deleted, 1);
    assert_eq!(outcome.failed, 0);
}

#[tokio::test]
async fn tuning_jobs_use_the_same_prefix_filter() {
    let fake = Arc::new(FakePlatform {
        tuning_jobs: vec![
            ResourceSummary::new("projects/p/hpJobs/1", "demo-sweep"),
            ResourceSummary::new("projects/p/hpJobs/2", "unrelated"),
        ],
        ..FakePlatform::default()
    });
    let report = reclaimer(&fake)
        .sweep(&PhaseSet::none().with(ReclaimPhase::TuningJobs))
        .await;

    assert_eq!(fake.calls(), vec!["delete_tuning_job projects/p/hpJobs/1"]);
    assert_eq!(report.total_deleted(), 1);
}

#[tokio::test]
async fn endpoint_is_undeployed_before_it_is_deleted() {
    let fake = Arc::new(FakePlatform {
        endpoints: vec![ResourceSummary::new("projects/p/endpoints/1", "demo-ep")],
        endpoint_models: HashMap::from([(
            "projects/p/endpoints/1".to_string(),
            vec!["model-a".to_string(), "model-b".to_string()],
        )]),
        ..FakePlatform::default()
    });
    let report = reclaimer(&fake)
        .sweep(&PhaseSet::none().with(ReclaimPhase::Endpoints))
        .await;

    let undeploy_a = fake.call_index("undeploy projects/p/endpoints/1/model-a");
    let undeploy_b = fake.call_index("undeploy projects/p/endpoints/1/model-b");
    let undeploy_done = fake.call_index("undeploy_all projects/p/endpoints/1");
    let delete = fake.call_index("delete_endpoint projects/p/endpoints/1");
    assert!(undeploy_a.is_some() && undeploy_b.is_some());
    assert!(undeploy_done < delete);
    assert_eq!(report.total_deleted(), 1);
}

#[tokio::test]
async fn failed_undeploy_skips_the_delete_but_not_other_endpoints() {
    let fake = Arc::new(FakePlatform {
        endpoints: vec![
            ResourceSummary::new("projects/p/endpoints/1", "demo-ep"),
            ResourceSummary::new("projects/p/endpoints/2", "demo-ep-2"),
        ],
        fail_undeploys: HashSet::from(["projects/p/endpoints/1".to_string()]),
        ..FakePlatform::default()
    });
    let report = reclaimer(&fake)
        .sweep(&PhaseSet::none().with(ReclaimPhase::Endpoints))
        .await;

    assert_eq!(fake.call_index("delete_endpoint projects/p/endpoints/1"), None);
    assert!(fake.call_index("delete_endpoint projects/p/endpoints/2").is_some());
    let outcome = report.phase(ReclaimPhase::Endpoints).expect("phase ran");
    assert_eq!(outcome.deleted, 1);
    assert_eq!(outcome.failed, 1);
}

#[tokio::test]
async fn spawned_jobs_are_deleted_before_their_pipeline_run() {
    let run_name = "projects/p/locations/l/pipelineJobs/demo-pipeline-1";
    let fake = Arc::new(FakePlatform {
        runs: vec![run_name.to_string()],
        run_details: HashMap::from([(
            run_name.to_string(),
            run_detail(
                run_name,
                &[
                    ("prepare", None),
                    ("train", Some("projects/p/locations/l/customJobs/demo-job-7")),
                    ("report", None),
                ],
            ),
        )]),
        ..FakePlatform::default()
    });
    let report = reclaimer(&fake)
        .sweep(&PhaseSet::none().with(ReclaimPhase::PipelineRuns))
        .await;

    let job_delete =
        fake.call_index("delete_custom_job projects/p/locations/l/customJobs/demo-job-7");
    let run_delete = fake.call_index(&format!("delete_pipeline_run {run_name}"));
    assert!(job_delete.is_some());
    assert!(job_delete < run_delete);
    // the two tasks without container detail produced no deletions
    assert_eq!(report.total_deleted(), 2);
}

#[tokio::test]
async fn pipeline_runs_are_listed_by_exact_pipeline_name() {
    let fake = Arc::new(FakePlatform::default());
    reclaimer(&fake)
        .sweep(&PhaseSet::none().with(ReclaimPhase::PipelineRuns))
        .await;
    assert_eq!(fake.calls(), vec!["list_pipeline_runs filter=demo-pipeline"]);
}

#[tokio::test]
async fn unreadable_run_detail_skips_that_run_only() {
    let readable = "projects/p/locations/l/pipelineJobs/demo-pipeline-2";
    let fake = Arc::new(FakePlatform {
        runs: vec![
            "projects/p/locations/l/pipelineJobs/demo-pipeline-1".to_string(),
            readable.to_string(),
        ],
        run_details: HashMap::from([(readable.to_string(), run_detail(readable, &[]))]),
        ..FakePlatform::default()
    });
    let report = reclaimer(&fake)
        .sweep(&PhaseSet::none().with(ReclaimPhase::PipelineRuns))
        .await;

    assert_eq!(
        fake.call_index("delete_pipeline_run projects/p/locations/l/pipelineJobs/demo-pipeline-1"),
        None
    );
    assert!(fake
        .call_index(&format!("delete_pipeline_run {readable}"))
        .is_some());
    let outcome = report.phase(ReclaimPhase::PipelineRuns).expect("phase ran");
    assert_eq!(outcome.deleted, 1);
    assert_eq!(outcome.failed, 1);
}

#[tokio::test]
async fn artifacts_are_swept_unfiltered() {
    let fake = Arc::new(FakePlatform {
        artifacts: vec![
            ResourceSummary::new("projects/p/artifacts/1", "demo-metrics"),
            ResourceSummary::new("projects/p/artifacts/2", "other-dataset"),
            ResourceSummary::new("projects/p/artifacts/3", ""),
        ],
        ..FakePlatform::default()
    });
    let report = reclaimer(&fake)
        .sweep(&PhaseSet::none().with(ReclaimPhase::Artifacts))
        .await;
    assert_eq!(report.total_deleted(), 3);
}

#[tokio::test]
async fn one_failed_deletion_does_not_stop_the_phase() {
    let fake = Arc::new(FakePlatform {
        models: vec![
            ResourceSummary::new("projects/p/models/1", "demo-model-1"),
            ResourceSummary::new("projects/p/models/2", "demo-model-2"),
        ],
        fail_deletes: HashSet::from(["projects/p/models/1".to_string()]),
        ..FakePlatform::default()
    });
    let report = reclaimer(&fake)
        .sweep(&PhaseSet::none().with(ReclaimPhase::Models))
        .await;

    assert!(fake.call_index("delete_model projects/p/models/2").is_some());
    let outcome = report.phase(ReclaimPhase::Models).expect("phase ran");
    assert_eq!(outcome.deleted, 1);
    assert_eq!(outcome.failed, 1);
    assert!(!report.is_clean());
    assert!(outcome.errors[0].contains("already gone"));
}

#[tokio::test]
async fn full_sweep_runs_phases_in_dependency_order() {
    let run_name = "projects/p/locations/l/pipelineJobs/demo-pipeline-1";
    let fake = Arc::new(FakePlatform {
        custom_jobs: vec![ResourceSummary::new("projects/p/customJobs/1", "demo-run-1")],
        endpoints: vec![ResourceSummary::new("projects/p/endpoints/1", "demo-ep")],
        models: vec![ResourceSummary::new("projects/p/models/1", "demo-model")],
        runs: vec![run_name.to_string()],
        run_details: HashMap::from([(run_name.to_string(), run_detail(run_name, &[]))]),
        artifacts: vec![ResourceSummary::new("projects/p/artifacts/1", "lineage")],
        ..FakePlatform::default()
    });
    let report = reclaimer(&fake).sweep(&PhaseSet::all()).await;

    let jobs = fake.call_index("delete_custom_job projects/p/customJobs/1");
    let endpoint = fake.call_index("delete_endpoint projects/p/endpoints/1");
    let model = fake.call_index("delete_model projects/p/models/1");
    let run = fake.call_index(&format!("delete_pipeline_run {run_name}"));
    let artifact = fake.call_index("delete_artifact projects/p/artifacts/1");
    assert!(jobs < endpoint);
    assert!(endpoint < model);
    assert!(model < run);
    assert!(run < artifact);
    assert_eq!(report.total_deleted(), 5);
    assert!(report.is_clean());
}

#[tokio::test]
async fn listing_failure_fails_the_phase_and_the_sweep_continues() {
    let mut jobs = MockJobService::new();
    jobs.expect_list_custom_jobs()
        .returning(|_| Err(VertexflowError::remote("JobService", "permission denied")));

    let mut models = MockModelService::new();
    models
        .expect_list_models()
        .returning(|_| Ok(vec![ResourceSummary::new("projects/p/models/1", "demo-m")]));
    models.expect_delete_model().returning(|_| Ok(()));

    let endpoints = MockEndpointService::new();
    let pipelines = MockPipelineService::new();
    let metadata = MockMetadataService::new();

    let reclaimer = Reclaimer::new(
        demo_config(),
        Arc::new(jobs),
        Arc::new(models),
        Arc::new(endpoints),
        Arc::new(pipelines),
        Arc::new(metadata),
    );
    let report = reclaimer
        .sweep(
            &PhaseSet::none()
                .with(ReclaimPhase::CustomJobs)
                .with(ReclaimPhase::Models),
        )
        .await;

    let jobs_outcome = report.phase(ReclaimPhase::CustomJobs).expect("phase ran");
    assert_eq!(jobs_outcome.deleted, 0);
    assert_eq!(jobs_outcome.failed, 1);
    let models_outcome = report.phase(ReclaimPhase::Models).expect("phase ran");
    assert_eq!(models_outcome.deleted, 1);
}

#[tokio::test]
async fn empty_phase_set_sweeps_nothing() {
    let fake = Arc::new(FakePlatform {
        custom_jobs: vec![ResourceSummary::new("projects/p/customJobs/1", "demo-run-1")],
        ..FakePlatform::default()
    });
    let report = reclaimer(&fake).sweep(&PhaseSet::none()).await;
    assert!(fake.calls().is_empty());
    assert!(report.phases.is_empty());
}
