//! Resource records exchanged with the managed platform.
//!
//! These mirror the platform's JSON wire shapes (camelCase keys) closely
//! enough to deserialize list/get responses; the glue layer never owns the
//! underlying resources, it only holds identifiers and display names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, VertexflowError};

/// The `(resource name, display name)` pair every listing call produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSummary {
    /// Fully qualified resource name.
    pub name: String,
    /// Human-readable display name.
    #[serde(default)]
    pub display_name: String,
}

impl ResourceSummary {
    /// Creates a summary from a resource name and display name.
    #[must_use]
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
        }
    }

    /// Whether the display name starts with the given prefix.
    #[must_use]
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.display_name.starts_with(prefix)
    }
}

/// Keeps one entry per resource: with a filter, only matching resources are
/// returned; without one, every resource is returned.
#[must_use]
pub fn filter_by_prefix(
    summaries: Vec<ResourceSummary>,
    prefix: Option<&str>,
) -> Vec<ResourceSummary> {
    match prefix {
        Some(prefix) => summaries
            .into_iter()
            .filter(|summary| summary.matches_prefix(prefix))
            .collect(),
        None => summaries,
    }
}

/// Detail record for a custom training job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomJobDetail {
    /// Fully qualified resource name.
    pub name: String,
    /// Human-readable display name.
    #[serde(default)]
    pub display_name: String,
    /// Job specification; only the output directory is of interest here.
    #[serde(default)]
    pub job_spec: JobSpec,
    /// When the job entered the running state.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// When the job reached a terminal state.
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl CustomJobDetail {
    /// Root output directory the job wrote artifacts under, if any.
    #[must_use]
    pub fn base_output_dir(&self) -> Option<&str> {
        self.job_spec
            .base_output_directory
            .as_ref()
            .map(|dest| dest.output_uri_prefix.as_str())
    }

    /// Wall-clock training time in seconds, when both timestamps are set.
    #[must_use]
    pub fn training_seconds(&self) -> Option<f64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => {
                Some((end - start).num_milliseconds() as f64 / 1000.0)
            }
            _ => None,
        }
    }
}

/// Subset of a custom-job specification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    /// Where the job stages its output artifacts.
    #[serde(default)]
    pub base_output_directory: Option<GcsDestination>,
}

/// A storage destination expressed as a URI prefix.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcsDestination {
    /// `gs://` prefix the platform writes under.
    #[serde(default)]
    pub output_uri_prefix: String,
}

/// Detail record for an endpoint, including its deployed models.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDetail {
    /// Fully qualified resource name.
    pub name: String,
    /// Human-readable display name.
    #[serde(default)]
    pub display_name: String,
    /// Models currently deployed on the endpoint.
    #[serde(default)]
    pub deployed_models: Vec<DeployedModel>,
}

/// A model copy deployed on an endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedModel {
    /// Deployment identifier, scoped to the endpoint.
    pub id: String,
    /// Resource name of the deployed model.
    #[serde(default)]
    pub model: String,
    /// Display name of the deployment.
    #[serde(default)]
    pub display_name: String,
}

/// Detail record for one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunDetail {
    /// Fully qualified resource name.
    pub name: String,
    /// Human-readable display name.
    #[serde(default)]
    pub display_name: String,
    /// Execution detail for the run.
    #[serde(default)]
    pub job_detail: PipelineJobDetail,
}

impl PipelineRunDetail {
    /// Resource names of custom jobs spawned by this run's tasks.
    #[must_use]
    pub fn spawned_jobs(&self) -> Vec<(&str, &str)> {
        self.job_detail
            .task_details
            .iter()
            .filter_map(|task| task.spawned_job().map(|job| (task.task_name.as_str(), job)))
            .collect()
    }
}

/// Execution plan of a pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineJobDetail {
    /// Per-task execution details.
    #[serde(default)]
    pub task_details: Vec<TaskDetail>,
}

/// Execution detail for one pipeline task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    /// Task name within the run.
    #[serde(default)]
    pub task_name: String,
    /// Executor detail; absent for tasks that ran no executor.
    #[serde(default)]
    pub executor_detail: Option<ExecutorDetail>,
}

impl TaskDetail {
    /// The custom-job resource this task spawned, if its executor detail
    /// carries a container detail with a main-job reference. Tasks without a
    /// container detail spawned no deletable job.
    #[must_use]
    pub fn spawned_job(&self) -> Option<&str> {
        self.executor_detail
            .as_ref()
            .and_then(|executor| executor.container_detail.as_ref())
            .and_then(|container| container.main_job.as_deref())
    }
}

/// Executor detail of a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorDetail {
    /// Present when the task executed in a container.
    #[serde(default)]
    pub container_detail: Option<ContainerDetail>,
}

/// Container-execution detail of a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDetail {
    /// Resource name of the main job backing the container execution.
    #[serde(default)]
    pub main_job: Option<String>,
}

/// A prediction request forwarded to a deployed endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    /// Instances in the serving container's expected envelope.
    pub instances: Vec<serde_json::Value>,
}

/// A prediction response from a deployed endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    /// Predictions, one per instance.
    #[serde(default)]
    pub predictions: Vec<serde_json::Value>,
    /// Which deployed model served the request.
    #[serde(default)]
    pub deployed_model_id: Option<String>,
}

/// A build request submitted to the remote build service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    /// Ordered build steps.
    pub steps: Vec<BuildStep>,
    /// Build timeout, as a duration string (for example `"7200s"`).
    #[serde(default)]
    pub timeout: Option<String>,
}

/// One step of a remote build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildStep {
    /// Builder image the step runs in.
    pub name: String,
    /// Arguments passed to the builder.
    pub args: Vec<String>,
}

impl BuildStep {
    /// Creates a build step.
    #[must_use]
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// Terminal state of a remote build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOutcome {
    /// Build identifier assigned by the build service.
    pub id: String,
    /// Terminal status string reported by the build service.
    pub status: String,
}

impl BuildOutcome {
    /// Whether the build finished successfully.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == "SUCCESS"
    }
}

/// Extracts the custom-job resource name (`projects/.../customJobs/...`) from
/// a job resource URI, which may carry an API-host prefix.
pub fn custom_job_name_from_uri(uri: &str) -> Result<String> {
    let segments: Vec<&str> = uri.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < 6 {
        return Err(VertexflowError::MalformedResourceName(uri.to_string()));
    }
    Ok(segments[segments.len() - 6..].join("/"))
}

/// Extracts the endpoint resource name (`projects/.../endpoints/...`) from an
/// operation resource URI that ends in `/operations/{id}`.
pub fn endpoint_name_from_uri(uri: &str) -> Result<String> {
    let segments: Vec<&str> = uri.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < 8 {
        return Err(VertexflowError::MalformedResourceName(uri.to_string()));
    }
    Ok(segments[segments.len() - 8..segments.len() - 2].join("/"))
}
