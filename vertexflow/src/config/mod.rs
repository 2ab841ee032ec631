//! Pipeline configuration.
//!
//! A single explicit value object replaces the process-wide constants the
//! scripts used to read: every operation takes a [`PipelineConfig`] (or a
//! value derived from one), and nothing in the crate consults globals.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, VertexflowError};

/// Scope and naming for one application's pipeline resources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Cloud project identifier.
    pub project: String,
    /// Region hosting the platform resources.
    #[serde(default = "default_region")]
    pub region: String,
    /// Staging bucket, including the `gs://` scheme.
    pub bucket: String,
    /// Application name used as the display-name prefix for every resource.
    pub app_name: String,
    /// Display name of the pipeline whose runs belong to this application.
    pub pipeline_name: String,
    /// Version tag appended to model display names.
    #[serde(default = "default_version")]
    pub version: String,
    /// Training worker shape.
    #[serde(default)]
    pub machine: MachineSpec,
    /// Serving container shape.
    #[serde(default)]
    pub serving: ServingSpec,
}

fn default_region() -> String {
    "us-central1".to_string()
}

fn default_version() -> String {
    Utc::now().format("%Y%m%d%H%M%S").to_string()
}

impl PipelineConfig {
    /// Creates a configuration for the given project, bucket, and app name,
    /// deriving the pipeline name and a timestamp version.
    #[must_use]
    pub fn new(
        project: impl Into<String>,
        bucket: impl Into<String>,
        app_name: impl Into<String>,
    ) -> Self {
        let app_name = app_name.into();
        Self {
            project: project.into(),
            region: default_region(),
            bucket: bucket.into(),
            pipeline_name: format!("pytorch-{app_name}"),
            app_name,
            version: default_version(),
            machine: MachineSpec::default(),
            serving: ServingSpec::default(),
        }
    }

    /// Reads the configuration from the environment.
    ///
    /// `PROJECT_ID`, `BUCKET`, and `APP_NAME` are required; `REGION` defaults
    /// to `us-central1` and `PIPELINE_NAME` to `pytorch-{APP_NAME}`.
    pub fn from_env() -> Result<Self> {
        let project = required_env("PROJECT_ID")?;
        let bucket = required_env("BUCKET")?;
        let app_name = required_env("APP_NAME")?;
        let mut config = Self::new(project, bucket, app_name);
        if let Ok(region) = std::env::var("REGION") {
            if !region.is_empty() {
                config.region = region;
            }
        }
        if let Ok(pipeline_name) = std::env::var("PIPELINE_NAME") {
            if !pipeline_name.is_empty() {
                config.pipeline_name = pipeline_name;
            }
        }
        Ok(config)
    }

    /// Sets the region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Sets the pipeline name.
    #[must_use]
    pub fn with_pipeline_name(mut self, name: impl Into<String>) -> Self {
        self.pipeline_name = name.into();
        self
    }

    /// Sets the version tag.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Regional API host for the platform.
    #[must_use]
    pub fn api_endpoint(&self) -> String {
        format!("{}-aiplatform.googleapis.com", self.region)
    }

    /// Location root path under which every resource of this scope lives.
    #[must_use]
    pub fn parent(&self) -> String {
        format!("projects/{}/locations/{}", self.project, self.region)
    }

    /// Root path for pipeline artifacts in the staging bucket.
    #[must_use]
    pub fn pipeline_root(&self) -> String {
        format!("{}/{}/pipelines", self.bucket, self.app_name)
    }

    /// Staging path for build sources; same prefix as the pipeline root.
    #[must_use]
    pub fn staging_path(&self) -> String {
        self.pipeline_root()
    }

    /// Versioned display name registered for the trained model.
    #[must_use]
    pub fn model_display_name(&self) -> String {
        format!("{}-{}", self.app_name, self.version)
    }

    /// Registry URI for the GPU training image.
    #[must_use]
    pub fn train_image_uri(&self) -> String {
        format!("gcr.io/{}/pytorch_gpu_train_{}", self.project, self.app_name)
    }

    /// Registry URI for the CPU serving image.
    #[must_use]
    pub fn serve_image_uri(&self) -> String {
        format!("gcr.io/{}/pytorch_cpu_predict_{}", self.project, self.app_name)
    }

    /// Predict route exposed by the serving container.
    #[must_use]
    pub fn predict_route(&self) -> String {
        format!("/predictions/{}", self.app_name)
    }
}

fn required_env(key: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(VertexflowError::Config(format!("{key} is not set"))),
    }
}

/// Worker shape for custom training jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineSpec {
    /// Machine type for each replica.
    pub machine_type: String,
    /// Number of worker replicas.
    pub replica_count: u32,
    /// Accelerator type attached to each replica.
    pub accelerator_type: String,
    /// Accelerators per replica.
    pub accelerator_count: u32,
    /// Data-loader workers per replica.
    pub num_workers: u32,
}

impl Default for MachineSpec {
    fn default() -> Self {
        Self {
            machine_type: "n1-standard-16".to_string(),
            replica_count: 1,
            accelerator_type: "NVIDIA_TESLA_T4".to_string(),
            accelerator_count: 1,
            num_workers: 1,
        }
    }
}

/// Shape of the online-serving deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServingSpec {
    /// Health-check route exposed by the serving container.
    pub health_route: String,
    /// Port the serving container listens on.
    pub container_port: u16,
    /// Machine type backing the endpoint deployment.
    pub machine_type: String,
    /// Minimum deployed replicas.
    pub min_replica_count: u32,
    /// Maximum deployed replicas.
    pub max_replica_count: u32,
}

impl Default for ServingSpec {
    fn default() -> Self {
        Self {
            health_route: "/ping".to_string(),
            container_port: 7080,
            machine_type: "n1-standard-4".to_string(),
            min_replica_count: 1,
            max_replica_count: 1,
        }
    }
}
