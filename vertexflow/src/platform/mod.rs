//! Contracts for the managed platform's remote services.
//!
//! Everything under this module is glue around opaque remote records: wire
//! types in [`resources`], per-kind protocol traits in [`services`], and the
//! REST implementations behind the `rest` feature.

pub mod resources;
pub mod services;

#[cfg(feature = "rest")]
pub mod rest;

pub use resources::{
    custom_job_name_from_uri, endpoint_name_from_uri, filter_by_prefix, BuildOutcome,
    BuildRequest, BuildStep,
    ContainerDetail, CustomJobDetail, DeployedModel, EndpointDetail, ExecutorDetail,
    GcsDestination, JobSpec, PipelineJobDetail, PipelineRunDetail, PredictRequest,
    PredictResponse, ResourceSummary, TaskDetail,
};
pub use services::{
    BuildService, EndpointService, JobService, MetadataService, ModelService, PipelineService,
};

#[cfg(feature = "rest")]
pub use rest::{RestBuildClient, RestPlatformClient};
