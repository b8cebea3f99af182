//! Error types for pipeline jobs.
//!
//! Every failure is classified into an [`ErrorKind`] and, at the job
//! boundary, flattened into a [`JobFailure`] that travels back to the caller
//! as a terminal event.

use std::error::Error as _;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use relief_color::ColorError;
use relief_heightmap::HeightmapError;
use relief_mesh::MeshError;

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that can occur while configuring or running jobs.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Pixel buffer, palette or clustering parameters rejected.
    #[error(transparent)]
    Color(#[from] ColorError),

    /// Meshing parameters rejected.
    #[error(transparent)]
    Heightmap(#[from] HeightmapError),

    /// Mesh could not be encoded.
    #[error(transparent)]
    Mesh(#[from] MeshError),

    /// Configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration could not be written as TOML.
    #[error("failed to encode configuration: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    /// Configuration could not be written as JSON.
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// File access failed.
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The background worker has shut down.
    #[error("{worker} worker is no longer running")]
    WorkerStopped { worker: &'static str },

    /// A job panicked.
    #[error("job panicked: {message}")]
    Panicked { message: String },
}

/// Failure category reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input or out-of-range parameter, rejected before processing.
    InvalidInput,
    /// Inconsistent geometry found while encoding the mesh.
    SerializationFailure,
    /// Anything else: I/O, worker shutdown, panics.
    Internal,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Color(_) | PipelineError::Heightmap(_) | PipelineError::ConfigParse(_) => {
                ErrorKind::InvalidInput
            }
            PipelineError::Mesh(_) => ErrorKind::SerializationFailure,
            PipelineError::ConfigEncode(_)
            | PipelineError::Json(_)
            | PipelineError::Io { .. }
            | PipelineError::WorkerStopped { .. }
            | PipelineError::Panicked { .. } => ErrorKind::Internal,
        }
    }
}

/// Terminal error payload of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobFailure {
    pub message: String,
    pub kind: ErrorKind,
    /// Messages of the underlying causes, outermost first.
    pub stack: Vec<String>,
}

impl JobFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            stack: Vec::new(),
        }
    }
}

impl From<&PipelineError> for JobFailure {
    fn from(err: &PipelineError) -> Self {
        let mut stack = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            stack.push(cause.to_string());
            source = cause.source();
        }
        Self {
            message: err.to_string(),
            kind: err.kind(),
            stack,
        }
    }
}

impl From<PipelineError> for JobFailure {
    fn from(err: PipelineError) -> Self {
        Self::from(&err)
    }
}

impl std::fmt::Display for JobFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for JobFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_lower_errors() {
        let color: PipelineError = ColorError::ClusterCount { k: 9, min: 2, max: 8 }.into();
        assert_eq!(color.kind(), ErrorKind::InvalidInput);

        let mesh: PipelineError = MeshError::IndexOutOfRange {
            face: 0,
            index: 7,
            vertex_count: 3,
        }
        .into();
        assert_eq!(mesh.kind(), ErrorKind::SerializationFailure);

        let stopped = PipelineError::WorkerStopped { worker: "mesh" };
        assert_eq!(stopped.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_failure_carries_source_chain() {
        let err = PipelineError::Mesh(MeshError::Encode {
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        });
        let failure = JobFailure::from(&err);

        assert_eq!(failure.kind, ErrorKind::SerializationFailure);
        assert!(failure.message.contains("disk full"));
        assert_eq!(failure.stack, vec!["disk full".to_string()]);
    }
}
