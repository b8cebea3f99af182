//! Error types for heightmap meshing.

use thiserror::Error;

/// Result type alias for heightmap operations.
pub type HeightmapResult<T> = Result<T, HeightmapError>;

/// Errors that can occur while meshing a heightmap.
#[derive(Debug, Error)]
pub enum HeightmapError {
    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    /// Too few sampled columns or rows to span a surface.
    #[error(
        "sampling grid too small: {columns}x{rows} vertices from a {grid_width}x{grid_height} grid (need at least 2x2)"
    )]
    GridTooSmall {
        grid_width: usize,
        grid_height: usize,
        columns: usize,
        rows: usize,
    },

    /// Vertex count does not fit a 32-bit index.
    #[error("mesh would need {count} vertices, more than a 32-bit index can address")]
    TooManyVertices { count: usize },
}

impl HeightmapError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        HeightmapError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}
