//! Container image builds through the remote build service.
//!
//! Both images are built the same way: copy the Dockerfile (and, for the
//! training image, the application source) out of the staging bucket, then
//! run the caching image builder, which pushes the result to the registry on
//! its own. The build timeout is raised well past the service's ten-minute
//! default because training images pull large framework layers.

use tracing::info;

use crate::errors::{Result, VertexflowError};
use crate::platform::resources::{BuildRequest, BuildStep};
use crate::platform::services::BuildService;

/// Build timeout, overriding the build service's default.
pub const BUILD_TIMEOUT_SECS: u64 = 7200;

const GSUTIL_BUILDER: &str = "gcr.io/cloud-builders/gsutil";
const KANIKO_BUILDER: &str = "gcr.io/kaniko-project/executor:latest";

/// Build request for the custom training image: pulls the training source
/// tree and Dockerfile from the staging bucket, then builds with layer
/// caching enabled.
#[must_use]
pub fn train_image_build(gs_train_src_path: &str, training_image_uri: &str) -> BuildRequest {
    BuildRequest {
        steps: vec![
            BuildStep::new(
                GSUTIL_BUILDER,
                vec![
                    "cp".to_string(),
                    "-r".to_string(),
                    join_gs(gs_train_src_path, "src/"),
                    ".".to_string(),
                ],
            ),
            BuildStep::new(
                GSUTIL_BUILDER,
                vec![
                    "cp".to_string(),
                    join_gs(gs_train_src_path, "Dockerfile"),
                    "Dockerfile".to_string(),
                ],
            ),
            kaniko_step(training_image_uri),
        ],
        timeout: Some(format!("{BUILD_TIMEOUT_SECS}s")),
    }
}

/// Build request for the custom serving image: only the Dockerfile comes from
/// the staging bucket, dependencies are declared inside it.
#[must_use]
pub fn serving_image_build(
    gs_serving_dependencies_path: &str,
    serving_image_uri: &str,
) -> BuildRequest {
    BuildRequest {
        steps: vec![
            BuildStep::new(
                GSUTIL_BUILDER,
                vec![
                    "cp".to_string(),
                    join_gs(gs_serving_dependencies_path, "Dockerfile"),
                    "Dockerfile".to_string(),
                ],
            ),
            kaniko_step(serving_image_uri),
        ],
        timeout: Some(format!("{BUILD_TIMEOUT_SECS}s")),
    }
}

fn kaniko_step(destination: &str) -> BuildStep {
    BuildStep::new(
        KANIKO_BUILDER,
        vec![format!("--destination={destination}"), "--cache=true".to_string()],
    )
}

fn join_gs(base: &str, name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), name)
}

/// Builds the custom training image and returns its registry URI.
pub async fn build_training_image(
    builds: &dyn BuildService,
    project: &str,
    gs_train_src_path: &str,
    training_image_uri: &str,
) -> Result<String> {
    info!(image = %training_image_uri, source = %gs_train_src_path, "building training image");
    let request = train_image_build(gs_train_src_path, training_image_uri);
    await_build(builds, project, &request).await?;
    Ok(training_image_uri.to_string())
}

/// Builds the custom serving image and returns its registry URI.
pub async fn build_serving_image(
    builds: &dyn BuildService,
    project: &str,
    gs_serving_dependencies_path: &str,
    serving_image_uri: &str,
) -> Result<String> {
    info!(image = %serving_image_uri, source = %gs_serving_dependencies_path, "building serving image");
    let request = serving_image_build(gs_serving_dependencies_path, serving_image_uri);
    await_build(builds, project, &request).await?;
    Ok(serving_image_uri.to_string())
}

async fn await_build(
    builds: &dyn BuildService,
    project: &str,
    request: &BuildRequest,
) -> Result<()> {
    let outcome = builds.run_build(project, request).await?;
    info!(build_id = %outcome.id, status = %outcome.status, "build finished");
    if outcome.is_success() {
        Ok(())
    } else {
        Err(VertexflowError::BuildFailed {
            build_id: outcome.id,
            status: outcome.status,
        })
    }
}
