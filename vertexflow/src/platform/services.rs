//! Protocol traits for the managed platform's resource services.
//!
//! One trait per remote collaborator, mirroring the platform's per-kind
//! service clients. Implementations are pluggable; the REST client behind the
//! `rest` feature is the production one, tests substitute mocks.

use async_trait::async_trait;

use super::resources::{
    BuildOutcome, BuildRequest, CustomJobDetail, EndpointDetail, PipelineRunDetail,
    PredictRequest, PredictResponse, ResourceSummary,
};
use crate::errors::Result;

/// Job service: custom training and hyperparameter-tuning jobs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobService: Send + Sync {
    /// Lists every custom job under the given location parent.
    async fn list_custom_jobs(&self, parent: &str) -> Result<Vec<ResourceSummary>>;

    /// Fetches the detail record of one custom job.
    async fn get_custom_job(&self, name: &str) -> Result<CustomJobDetail>;

    /// Deletes one custom job.
    async fn delete_custom_job(&self, name: &str) -> Result<()>;

    /// Lists every hyperparameter-tuning job under the given location parent.
    async fn list_hyperparameter_tuning_jobs(&self, parent: &str) -> Result<Vec<ResourceSummary>>;

    /// Deletes one hyperparameter-tuning job.
    async fn delete_hyperparameter_tuning_job(&self, name: &str) -> Result<()>;
}

/// Model service: the model registry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Lists every model under the given location parent.
    async fn list_models(&self, parent: &str) -> Result<Vec<ResourceSummary>>;

    /// Deletes one model. Fails remotely if the model is still deployed.
    async fn delete_model(&self, name: &str) -> Result<()>;
}

/// Endpoint service: online-serving endpoints.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EndpointService: Send + Sync {
    /// Lists every endpoint under the given location parent.
    async fn list_endpoints(&self, parent: &str) -> Result<Vec<ResourceSummary>>;

    /// Fetches an endpoint's detail record, including deployed models.
    async fn get_endpoint(&self, name: &str) -> Result<EndpointDetail>;

    /// Undeploys every model from the endpoint, waiting for each undeploy
    /// operation to finish before returning.
    async fn undeploy_all(&self, name: &str) -> Result<()>;

    /// Deletes one endpoint. Only safe after all models are undeployed.
    async fn delete_endpoint(&self, name: &str) -> Result<()>;

    /// Sends a prediction request to a deployed endpoint.
    async fn predict(&self, name: &str, request: PredictRequest) -> Result<PredictResponse>;
}

/// Pipeline service: pipeline runs and their execution details.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PipelineService: Send + Sync {
    /// Lists pipeline runs under the given location parent. When a display
    /// name is supplied, only runs with exactly that display name are
    /// returned, ordered by end time.
    async fn list_pipeline_runs(
        &self,
        parent: &str,
        display_name: Option<String>,
    ) -> Result<Vec<String>>;

    /// Fetches one pipeline run's detail record, including its task tree.
    async fn get_pipeline_run(&self, name: &str) -> Result<PipelineRunDetail>;

    /// Deletes one pipeline run.
    async fn delete_pipeline_run(&self, name: &str) -> Result<()>;
}

/// Metadata service: lineage artifacts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataService: Send + Sync {
    /// Lists every metadata artifact under the given location parent,
    /// without any display-name filtering.
    async fn list_artifacts(&self, parent: &str) -> Result<Vec<ResourceSummary>>;

    /// Deletes one metadata artifact.
    async fn delete_artifact(&self, name: &str) -> Result<()>;
}

/// Remote build service: container image builds.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BuildService: Send + Sync {
    /// Submits a build and waits for it to reach a terminal state.
    async fn run_build(&self, project: &str, build: &BuildRequest) -> Result<BuildOutcome>;
}
