//! REST implementations of the platform service protocols.
//!
//! The platform exposes one regional host for resource services and a global
//! host for the build service. Both clients speak plain JSON with a bearer
//! token; long-running operations (undeploy, build) are polled to completion
//! because callers depend on them having finished.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::resources::{
    BuildOutcome, BuildRequest, CustomJobDetail, EndpointDetail, PipelineRunDetail,
    PredictRequest, PredictResponse, ResourceSummary,
};
use super::services::{
    BuildService, EndpointService, JobService, MetadataService, ModelService, PipelineService,
};
use crate::config::PipelineConfig;
use crate::errors::{Result, VertexflowError};

const OPERATION_POLL_INTERVAL: Duration = Duration::from_secs(2);
const OPERATION_POLL_LIMIT: usize = 300;
const BUILD_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// REST client for the platform's regional resource services.
#[derive(Debug, Clone)]
pub struct RestPlatformClient {
    http: reqwest::Client,
    base: String,
    token: String,
}

impl RestPlatformClient {
    /// Creates a client for the region named in the configuration.
    pub fn new(config: &PipelineConfig, token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            base: format!("https://{}/v1", config.api_endpoint()),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, service: &str, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let body = check_status(service, response).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn post_json(&self, service: &str, url: &str, payload: &Value) -> Result<Value> {
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await?;
        check_status(service, response).await
    }

    async fn delete(&self, service: &str, name: &str) -> Result<()> {
        let url = self.url(name);
        let response = self
            .http
            .delete(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        check_status(service, response).await?;
        Ok(())
    }

    /// Lists a collection, following `nextPageToken` until exhausted. The
    /// item array key differs per resource kind (`customJobs`, `models`, …).
    async fn list_summaries(
        &self,
        service: &str,
        collection_url: &str,
        items_key: &str,
    ) -> Result<Vec<ResourceSummary>> {
        let mut summaries = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let url = match &page_token {
                Some(token) => format!("{collection_url}?pageToken={token}"),
                None => collection_url.to_string(),
            };
            let page: Value = self.get_json(service, &url).await?;
            if let Some(items) = page.get(items_key).and_then(Value::as_array) {
                for item in items {
                    summaries.push(serde_json::from_value(item.clone())?);
                }
            }
            page_token = page
                .get("nextPageToken")
                .and_then(Value::as_str)
                .map(str::to_string);
            if page_token.is_none() {
                break;
            }
        }
        Ok(summaries)
    }

    /// Polls a long-running operation until it reports `done`.
    async fn wait_operation(&self, service: &str, operation: &Value) -> Result<()> {
        let name = operation
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                VertexflowError::unexpected(service, "operation response has no name")
            })?
            .to_string();
        for _ in 0..OPERATION_POLL_LIMIT {
            let status: Value = self.get_json(service, &self.url(&name)).await?;
            if let Some(error) = status.get("error") {
                return Err(VertexflowError::remote(service, error.to_string()));
            }
            if status.get("done").and_then(Value::as_bool) == Some(true) {
                debug!(operation = %name, "operation finished");
                return Ok(());
            }
            tokio::time::sleep(OPERATION_POLL_INTERVAL).await;
        }
        Err(VertexflowError::remote(
            service,
            format!("operation {name} did not finish in time"),
        ))
    }
}

async fn check_status(service: &str, response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    if status.is_success() {
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        let text = response.text().await?;
        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(VertexflowError::remote(
            service,
            format!("HTTP {status}: {body}"),
        ))
    }
}

#[async_trait]
impl JobService for RestPlatformClient {
    async fn list_custom_jobs(&self, parent: &str) -> Result<Vec<ResourceSummary>> {
        let url = self.url(&format!("{parent}/customJobs"));
        self.list_summaries("JobService", &url, "customJobs").await
    }

    async fn get_custom_job(&self, name: &str) -> Result<CustomJobDetail> {
        self.get_json("JobService", &self.url(name)).await
    }

    async fn delete_custom_job(&self, name: &str) -> Result<()> {
        self.delete("JobService", name).await
    }

    async fn list_hyperparameter_tuning_jobs(&self, parent: &str) -> Result<Vec<ResourceSummary>> {
        let url = self.url(&format!("{parent}/hyperparameterTuningJobs"));
        self.list_summaries("JobService", &url, "hyperparameterTuningJobs")
            .await
    }

    async fn delete_hyperparameter_tuning_job(&self, name: &str) -> Result<()> {
        self.delete("JobService", name).await
    }
}

#[async_trait]
impl ModelService for RestPlatformClient {
    async fn list_models(&self, parent: &str) -> Result<Vec<ResourceSummary>> {
        let url = self.url(&format!("{parent}/models"));
        self.list_summaries("ModelService", &url, "models").await
    }

    async fn delete_model(&self, name: &str) -> Result<()> {
        self.delete("ModelService", name).await
    }
}

#[async_trait]
impl EndpointService for RestPlatformClient {
    async fn list_endpoints(&self, parent: &str) -> Result<Vec<ResourceSummary>> {
        let url = self.url(&format!("{parent}/endpoints"));
        self.list_summaries("EndpointService", &url, "endpoints")
            .await
    }

    async fn get_endpoint(&self, name: &str) -> Result<EndpointDetail> {
        self.get_json("EndpointService", &self.url(name)).await
    }

    async fn undeploy_all(&self, name: &str) -> Result<()> {
        let endpoint = self.get_endpoint(name).await?;
        for deployed in &endpoint.deployed_models {
            let url = self.url(&format!("{name}:undeployModel"));
            let payload = serde_json::json!({ "deployedModelId": deployed.id });
            let operation = self.post_json("EndpointService", &url, &payload).await?;
            self.wait_operation("EndpointService", &operation).await?;
        }
        Ok(())
    }

    async fn delete_endpoint(&self, name: &str) -> Result<()> {
        self.delete("EndpointService", name).await
    }

    async fn predict(&self, name: &str, request: PredictRequest) -> Result<PredictResponse> {
        let url = self.url(&format!("{name}:predict"));
        let payload = serde_json::to_value(&request)?;
        let body = self.post_json("EndpointService", &url, &payload).await?;
        Ok(serde_json::from_value(body)?)
    }
}

#[async_trait]
impl PipelineService for RestPlatformClient {
    async fn list_pipeline_runs(
        &self,
        parent: &str,
        display_name: Option<String>,
    ) -> Result<Vec<String>> {
        let collection = format!("{parent}/pipelineJobs");
        let mut runs = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = format!("{}?orderBy=end_time", self.url(&collection));
            if let Some(display_name) = &display_name {
                url.push_str(&format!("&filter=display_name%3D%22{display_name}%22"));
            }
            if let Some(token) = &page_token {
                url.push_str(&format!("&pageToken={token}"));
            }
            let page: Value = self.get_json("PipelineService", &url).await?;
            if let Some(items) = page.get("pipelineJobs").and_then(Value::as_array) {
                for item in items {
                    if let Some(name) = item.get("name").and_then(Value::as_str) {
                        runs.push(name.to_string());
                    }
                }
            }
            page_token = page
                .get("nextPageToken")
                .and_then(Value::as_str)
                .map(str::to_string);
            if page_token.is_none() {
                break;
            }
        }
        Ok(runs)
    }

    async fn get_pipeline_run(&self, name: &str) -> Result<PipelineRunDetail> {
        self.get_json("PipelineService", &self.url(name)).await
    }

    async fn delete_pipeline_run(&self, name: &str) -> Result<()> {
        self.delete("PipelineService", name).await
    }
}

#[async_trait]
impl MetadataService for RestPlatformClient {
    async fn list_artifacts(&self, parent: &str) -> Result<Vec<ResourceSummary>> {
        let url = self.url(&format!("{parent}/metadataStores/default/artifacts"));
        self.list_summaries("MetadataService", &url, "artifacts")
            .await
    }

    async fn delete_artifact(&self, name: &str) -> Result<()> {
        self.delete("MetadataService", name).await
    }
}

/// REST client for the remote build service.
#[derive(Debug, Clone)]
pub struct RestBuildClient {
    http: reqwest::Client,
    base: String,
    token: String,
}

impl RestBuildClient {
    /// Creates a build-service client.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            base: "https://cloudbuild.googleapis.com/v1".to_string(),
            token: token.into(),
        })
    }

    async fn get_build(&self, project: &str, build_id: &str) -> Result<Value> {
        let url = format!("{}/projects/{project}/builds/{build_id}", self.base);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        check_status("BuildService", response).await
    }
}

#[async_trait]
impl BuildService for RestBuildClient {
    async fn run_build(&self, project: &str, build: &BuildRequest) -> Result<BuildOutcome> {
        let url = format!("{}/projects/{project}/builds", self.base);
        let payload = serde_json::to_value(build)?;
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;
        let operation = check_status("BuildService", response).await?;

        let build_id = operation
            .pointer("/metadata/build/id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                VertexflowError::unexpected("BuildService", "create response has no build id")
            })?
            .to_string();
        debug!(build_id = %build_id, "build submitted");

        // the build service enforces the request's own timeout; polling stops
        // as soon as the build leaves the working states
        loop {
            let record = self.get_build(project, &build_id).await?;
            let status = record
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or("STATUS_UNKNOWN")
                .to_string();
            match status.as_str() {
                "QUEUED" | "PENDING" | "WORKING" | "STATUS_UNKNOWN" => {
                    tokio::time::sleep(BUILD_POLL_INTERVAL).await;
                }
                _ => {
                    return Ok(BuildOutcome {
                        id: build_id,
                        status,
                    })
                }
            }
        }
    }
}
