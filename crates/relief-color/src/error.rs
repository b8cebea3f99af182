//! Error types for color operations.

use thiserror::Error;

/// Result type alias for color operations.
pub type ColorResult<T> = Result<T, ColorError>;

/// Errors that can occur while building pixel buffers, palettes, or clusters.
#[derive(Debug, Error)]
pub enum ColorError {
    /// Width or height is zero.
    #[error("image dimensions must be non-zero, got {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    /// Pixel data length does not match the dimensions.
    #[error("pixel buffer has {actual} bytes, expected {expected} for RGBA data")]
    BufferLength { expected: usize, actual: usize },

    /// Requested cluster count outside the supported range.
    #[error("cluster count {k} is outside [{min}, {max}]")]
    ClusterCount { k: usize, min: usize, max: usize },

    /// A color string is not `#RRGGBB`.
    #[error("invalid hex color {value:?}")]
    InvalidHex { value: String },

    /// A palette has more entries than a per-pixel index can address.
    #[error("palette has {len} colors, at most {max} are supported")]
    PaletteTooLarge { len: usize, max: usize },

    /// Palette index data does not line up with the pixels.
    #[error("palette index has {actual} entries for {expected} pixels")]
    IndexLength { expected: usize, actual: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl ColorError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        ColorError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}
