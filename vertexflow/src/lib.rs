//! # Vertexflow
//!
//! Glue for a machine-learning pipeline on a managed cloud ML platform.
//!
//! Vertexflow orchestrates the pieces around the platform's own services:
//!
//! - **Image builds**: container images built by the remote build service
//! - **Training details**: metrics and artifacts of finished training jobs
//! - **Model archiving**: packaging artifacts for the serving toolkit
//! - **Prediction requests**: invoking a deployed prediction endpoint
//! - **Resource reclaiming**: best-effort cleanup of jobs, models,
//!   endpoints, pipeline runs, and metadata artifacts
//!
//! Every meaningful operation is a call into the platform; the service
//! contracts live in [`platform`], and the production REST clients sit
//! behind the `rest` feature.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vertexflow::prelude::*;
//!
//! let config = PipelineConfig::from_env()?;
//! let client = Arc::new(RestPlatformClient::new(&config, token)?);
//! let reclaimer = Reclaimer::new(
//!     config,
//!     client.clone(),
//!     client.clone(),
//!     client.clone(),
//!     client.clone(),
//!     client,
//! );
//! let report = reclaimer.sweep(&PhaseSet::all()).await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod components;
pub mod config;
pub mod errors;
pub mod observability;
pub mod platform;
pub mod reclaim;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::components::{
        build_serving_image, build_training_image, generate_mar_file,
        get_training_job_details, make_prediction_request, MarOutputs, TrainingJobReport,
    };
    pub use crate::config::{MachineSpec, PipelineConfig, ServingSpec};
    pub use crate::errors::{Result, VertexflowError};
    pub use crate::platform::{
        BuildService, EndpointService, JobService, MetadataService, ModelService,
        PipelineService, PredictRequest, PredictResponse, ResourceSummary,
    };
    pub use crate::reclaim::{PhaseSet, PhaseOutcome, ReclaimPhase, Reclaimer, SweepReport};

    #[cfg(feature = "rest")]
    pub use crate::platform::{RestBuildClient, RestPlatformClient};
}

#[cfg(test)]
mod tests {
    #[test]
    fn library_compiles() {
        assert!(true);
    }
}
