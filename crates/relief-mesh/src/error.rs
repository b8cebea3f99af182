//! Error types for mesh operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for mesh operations.
pub type MeshResult<T> = Result<T, MeshError>;

/// Errors that can occur during mesh operations.
#[derive(Debug, Error)]
pub enum MeshError {
    /// A face references a vertex that does not exist.
    #[error("face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        face: usize,
        index: u32,
        vertex_count: usize,
    },

    /// Too many triangles for the 32-bit STL triangle count.
    #[error("mesh has {count} triangles, exceeding the STL limit of {}", u32::MAX)]
    TooManyTriangles { count: usize },

    /// Error encoding the binary STL stream.
    #[error("failed to encode binary STL: {source}")]
    Encode {
        #[source]
        source: std::io::Error,
    },

    /// Error writing to a file.
    #[error("failed to write mesh to {path}: {source}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
