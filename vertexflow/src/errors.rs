//! Error types for the vertexflow glue layer.
//!
//! Every remote collaborator (platform services, build service, archiver
//! process) is opaque; failures surface here as coarse-grained variants that
//! carry enough context for the per-item log lines the reclaimer emits.

use thiserror::Error;

/// The main error type for vertexflow operations.
#[derive(Debug, Error)]
pub enum VertexflowError {
    /// A remote platform call failed (network, permission, not-found).
    #[error("remote call to {service} failed: {message}")]
    RemoteCall {
        /// Which remote service the call targeted.
        service: String,
        /// Service-reported or transport-level message.
        message: String,
    },

    /// A remote response did not have the expected shape.
    #[error("unexpected response from {service}: {message}")]
    UnexpectedResponse {
        /// Which remote service produced the response.
        service: String,
        /// What was missing or malformed.
        message: String,
    },

    /// A remote image build finished in a non-success state.
    #[error("image build {build_id} finished with status {status}")]
    BuildFailed {
        /// Build identifier assigned by the build service.
        build_id: String,
        /// Terminal status reported by the build service.
        status: String,
    },

    /// The model archiver tool failed.
    #[error("model archiver failed: {0}")]
    Archive(String),

    /// Configuration was missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// A resource identifier could not be parsed.
    #[error("malformed resource name: {0}")]
    MalformedResourceName(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error.
    #[cfg(feature = "rest")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl VertexflowError {
    /// Creates a remote-call error for the named service.
    #[must_use]
    pub fn remote(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteCall {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Creates an unexpected-response error for the named service.
    #[must_use]
    pub fn unexpected(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            service: service.into(),
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VertexflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_display_names_the_service() {
        let err = VertexflowError::remote("JobService", "permission denied");
        assert_eq!(
            err.to_string(),
            "remote call to JobService failed: permission denied"
        );
    }

    #[test]
    fn build_failed_display_includes_status() {
        let err = VertexflowError::BuildFailed {
            build_id: "b-123".to_string(),
            status: "TIMEOUT".to_string(),
        };
        assert!(err.to_string().contains("TIMEOUT"));
    }
}
