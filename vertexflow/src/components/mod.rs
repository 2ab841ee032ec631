//! Pipeline-component glue.
//!
//! Each submodule mirrors one custom pipeline component: remote image builds,
//! training-job details retrieval, model-archive generation, and prediction
//! requests against a deployed endpoint.

pub mod archive;
pub mod image_build;
pub mod prediction;
pub mod training;

pub use archive::{
    archive_spec, collect_extra_files, ensure_export_dir, generate_mar_file,
    resolve_handler_path, ArchiveSpec, MarEnvVar, MarOutputs, MODEL_STORE_DIR,
    SERIALIZED_FILE_NAME,
};
pub use image_build::{
    build_serving_image, build_training_image, serving_image_build, train_image_build,
    BUILD_TIMEOUT_SECS,
};
pub use prediction::{encode_instance, make_prediction_request};
pub use training::{
    get_training_job_details, read_metrics_file, TrainingJobReport, METRICS_FILE_NAME,
};
