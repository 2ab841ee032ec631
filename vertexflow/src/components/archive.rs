//! Model-archive generation for the serving toolkit.
//!
//! Packages trained model artifacts and the custom request handler into a
//! model archive by shelling out to `torch-model-archiver`, the same tool the
//! serving container loads archives from. Paths staged in the bucket are
//! visible locally under the `/gcs/` mount.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{info, warn};

use crate::errors::{Result, VertexflowError};

/// Filename of the serialized model weights inside the artifacts directory.
pub const SERIALIZED_FILE_NAME: &str = "pytorch_model.bin";

/// Subdirectory the archive is exported into.
pub const MODEL_STORE_DIR: &str = "model-store";

const HANDLER_FILE_SUFFIX: &str = "predictor/custom_handler.py";
const MKDIR_RETRY_PAUSE: Duration = Duration::from_secs(2);

/// Everything the archiver needs for one model archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveSpec {
    /// Model name baked into the archive.
    pub model_name: String,
    /// Archive version string.
    pub version: String,
    /// Path to the request handler.
    pub handler: String,
    /// Path to the serialized model weights.
    pub serialized_file: PathBuf,
    /// Additional artifact files packaged alongside the weights.
    pub extra_files: Vec<PathBuf>,
    /// Directory the archive is written into.
    pub export_path: PathBuf,
    /// Optional pip requirements file packaged into the archive.
    pub requirements_file: Option<PathBuf>,
}

impl ArchiveSpec {
    /// Arguments for the archiver invocation, in the tool's expected order.
    #[must_use]
    pub fn archiver_args(&self) -> Vec<String> {
        let mut args = vec![
            "--force".to_string(),
            "--model-name".to_string(),
            self.model_name.clone(),
            "--serialized-file".to_string(),
            self.serialized_file.display().to_string(),
            "--handler".to_string(),
            self.handler.clone(),
            "--version".to_string(),
            self.version.clone(),
            "--export-path".to_string(),
            self.export_path.display().to_string(),
        ];
        if !self.extra_files.is_empty() {
            args.push("--extra-files".to_string());
            args.push(
                self.extra_files
                    .iter()
                    .map(|file| file.display().to_string())
                    .collect::<Vec<_>>()
                    .join(","),
            );
        }
        if let Some(requirements) = &self.requirements_file {
            args.push("--requirements-file".to_string());
            args.push(requirements.display().to_string());
        }
        args
    }
}

/// Outputs of a successful archive generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarOutputs {
    /// Environment variables the serving deployment needs.
    pub env: Vec<MarEnvVar>,
    /// Bucket URI of the exported model store.
    pub export_uri: String,
}

/// One name/value environment entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarEnvVar {
    /// Variable name.
    pub name: String,
    /// Variable value.
    pub value: String,
}

/// Rewrites a bucket handler path to its local mount and appends the handler
/// file; a plain path (a bundled handler name) is passed through unchanged.
#[must_use]
pub fn resolve_handler_path(handler: &str) -> String {
    if handler.starts_with("gs://") {
        format!("{}{HANDLER_FILE_SUFFIX}", handler.replacen("gs://", "/gcs/", 1))
    } else {
        handler.to_string()
    }
}

/// Creates the export directory, retrying once after a short pause. The
/// bucket mount occasionally refuses the first create after job start.
pub async fn ensure_export_dir(path: &Path) -> Result<()> {
    if let Err(err) = tokio::fs::create_dir_all(path).await {
        warn!(path = %path.display(), error = %err, "creating export dir failed, retrying");
        tokio::time::sleep(MKDIR_RETRY_PAUSE).await;
        tokio::fs::create_dir_all(path).await?;
    }
    Ok(())
}

/// Files in the artifacts directory to package next to the weights:
/// everything except the serialized weights file itself.
pub async fn collect_extra_files(artifacts_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut extra_files = Vec::new();
    let mut entries = tokio::fs::read_dir(artifacts_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_name() != SERIALIZED_FILE_NAME {
            extra_files.push(entry.path());
        }
    }
    extra_files.sort();
    Ok(extra_files)
}

/// Builds the archive spec for a trained model.
///
/// `model_dir` is the local mount of the training job's output; artifacts
/// live at `{model_dir}/model/{model_name}`. The archive lands in
/// `{mar_dir}/model-store`.
pub async fn archive_spec(
    model_name: &str,
    version: &str,
    handler: &str,
    model_dir: &Path,
    mar_dir: &Path,
) -> Result<ArchiveSpec> {
    let artifacts_dir = model_dir.join("model").join(model_name);
    let extra_files = collect_extra_files(&artifacts_dir).await?;
    Ok(ArchiveSpec {
        model_name: model_name.to_string(),
        version: version.to_string(),
        handler: resolve_handler_path(handler),
        serialized_file: artifacts_dir.join(SERIALIZED_FILE_NAME),
        extra_files,
        export_path: mar_dir.join(MODEL_STORE_DIR),
        requirements_file: None,
    })
}

/// Generates the model archive and returns the serving deployment outputs.
///
/// `mar_uri` is the bucket URI corresponding to `mar_dir`; the returned
/// export URI points at the exported model store under it.
pub async fn generate_mar_file(
    model_name: &str,
    version: &str,
    handler: &str,
    model_dir: &Path,
    mar_dir: &Path,
    mar_uri: &str,
) -> Result<MarOutputs> {
    let spec = archive_spec(model_name, version, handler, model_dir, mar_dir).await?;
    ensure_export_dir(&spec.export_path).await?;

    info!(model = %spec.model_name, export = %spec.export_path.display(), "running model archiver");
    run_archiver(&spec).await?;

    Ok(MarOutputs {
        env: vec![MarEnvVar {
            name: "MODEL_NAME".to_string(),
            value: model_name.to_string(),
        }],
        export_uri: format!("{}/{MODEL_STORE_DIR}/", mar_uri.trim_end_matches('/')),
    })
}

async fn run_archiver(spec: &ArchiveSpec) -> Result<()> {
    let output = Command::new("torch-model-archiver")
        .args(spec.archiver_args())
        .output()
        .await?;
    if !output.status.success() || !output.stderr.is_empty() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        return Err(VertexflowError::Archive(stderr));
    }
    Ok(())
}
