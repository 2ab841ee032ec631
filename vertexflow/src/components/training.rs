//! Training-job details retrieval.
//!
//! After a custom training job finishes, the pipeline needs its artifact
//! location, wall-clock training time, and the metrics file the training code
//! wrote next to the model. The job is addressed by the resource URI the
//! pipeline framework hands downstream tasks, not by a bare name.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{Result, VertexflowError};
use crate::platform::resources::custom_job_name_from_uri;
use crate::platform::services::JobService;

/// Metrics filename the training code writes into the model directory.
pub const METRICS_FILE_NAME: &str = "all_results.json";

/// What a finished training job left behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingJobReport {
    /// Resource name of the custom job.
    pub job_name: String,
    /// Display name registered for the resulting model.
    pub model_name: String,
    /// Root directory the job wrote artifacts under.
    pub base_output_dir: String,
    /// Wall-clock training time in seconds, when the job recorded both ends.
    pub time_to_train_seconds: Option<f64>,
    /// Every numeric metric from the metrics file, in key order.
    pub metrics: BTreeMap<String, f64>,
    /// The requested evaluation metric, when present.
    pub eval_metric: Option<f64>,
    /// Evaluation loss, when present.
    pub eval_loss: Option<f64>,
}

impl TrainingJobReport {
    /// Model metadata in the shape downstream registration expects.
    #[must_use]
    pub fn model_metadata(&self) -> BTreeMap<String, serde_json::Value> {
        let mut metadata = BTreeMap::new();
        metadata.insert(
            "model_name".to_string(),
            serde_json::json!(self.model_name),
        );
        metadata.insert("framework".to_string(), serde_json::json!("pytorch"));
        metadata.insert("job_name".to_string(), serde_json::json!(self.job_name));
        if let Some(seconds) = self.time_to_train_seconds {
            metadata.insert(
                "time_to_train_in_seconds".to_string(),
                serde_json::json!(seconds),
            );
        }
        if let Some(eval_loss) = self.eval_loss {
            metadata.insert("eval_loss".to_string(), serde_json::json!(eval_loss));
        }
        metadata
    }
}

/// Fetches a finished training job's details and reads its metrics file.
///
/// `job_resource_uri` is the URI the pipeline framework records for the job;
/// only its trailing resource-name segments identify the job. `metrics_file`
/// points at the job's `all_results.json` on a locally mounted path.
pub async fn get_training_job_details(
    jobs: &dyn JobService,
    job_resource_uri: &str,
    model_name: &str,
    eval_metric_key: &str,
    metrics_file: &Path,
) -> Result<TrainingJobReport> {
    let job_name = custom_job_name_from_uri(job_resource_uri)?;
    info!(job = %job_name, "fetching custom job details");

    let job = jobs.get_custom_job(&job_name).await?;
    let base_output_dir = job
        .base_output_dir()
        .ok_or_else(|| {
            VertexflowError::unexpected("JobService", "custom job has no base output directory")
        })?
        .to_string();
    info!(job = %job_name, output_dir = %base_output_dir, "custom job fetched");

    let metrics = read_metrics_file(metrics_file).await?;
    for (key, value) in &metrics {
        info!(metric = %key, value = %value, "training metric");
    }
    let eval_metric = metrics.get(eval_metric_key).copied();
    let eval_loss = metrics.get("eval_loss").copied();
    info!(key = %eval_metric_key, value = ?eval_metric, "eval metric");

    Ok(TrainingJobReport {
        job_name,
        model_name: model_name.to_string(),
        base_output_dir,
        time_to_train_seconds: job.training_seconds(),
        metrics,
        eval_metric,
        eval_loss,
    })
}

/// Reads a flat JSON metrics file, keeping only numeric values.
pub async fn read_metrics_file(path: &Path) -> Result<BTreeMap<String, f64>> {
    let text = tokio::fs::read_to_string(path).await?;
    let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(&text)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| value.as_f64().map(|number| (key, number)))
        .collect())
}
