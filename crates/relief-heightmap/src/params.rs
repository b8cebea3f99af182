//! Physical dimensions and sampling controls for a relief.

use serde::{Deserialize, Serialize};

use crate::error::{HeightmapError, HeightmapResult};

/// Highest supported simplification level (stride of 8).
pub const MAX_SIMPLIFICATION: u8 = 3;

/// Parameters for heightmap meshing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshParams {
    /// Extent along X in mm, first to last grid column.
    pub object_width_mm: f64,
    /// Extent along Y in mm, first to last grid row.
    pub object_height_mm: f64,
    /// Thickness of the solid under the lowest layer.
    pub base_height_mm: f64,
    /// Height added per palette rank.
    pub layer_height_mm: f64,
    /// Fraction of source pixels per grid cell, in (0, 1].
    pub resolution: f64,
    /// Sample every `2^level` grid cells, level in 0..=3.
    pub simplification_level: u8,
}

impl Default for MeshParams {
    fn default() -> Self {
        Self {
            object_width_mm: 70.0,
            object_height_mm: 40.0,
            base_height_mm: 5.0,
            layer_height_mm: 1.0,
            resolution: 1.0,
            simplification_level: 0,
        }
    }
}

impl MeshParams {
    /// Grid stride.
    #[inline]
    pub fn skip(&self) -> usize {
        1usize << self.simplification_level.min(MAX_SIMPLIFICATION)
    }

    /// Height of a cell with the given palette rank.
    #[inline]
    pub fn height_for(&self, rank: Option<u8>) -> f64 {
        match rank {
            Some(r) => self.base_height_mm + f64::from(r) * self.layer_height_mm,
            None => self.base_height_mm,
        }
    }

    pub fn validate(&self) -> HeightmapResult<()> {
        positive("object_width_mm", self.object_width_mm)?;
        positive("object_height_mm", self.object_height_mm)?;
        non_negative("base_height_mm", self.base_height_mm)?;
        non_negative("layer_height_mm", self.layer_height_mm)?;

        if !(self.resolution > 0.0 && self.resolution <= 1.0) {
            return Err(HeightmapError::invalid_param(
                "resolution",
                self.resolution,
                "must be in (0, 1]",
            ));
        }
        if self.simplification_level > MAX_SIMPLIFICATION {
            return Err(HeightmapError::invalid_param(
                "simplification_level",
                self.simplification_level,
                "must be 0, 1, 2 or 3",
            ));
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> HeightmapResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(HeightmapError::invalid_param(name, value, "must be a positive number"))
    }
}

fn non_negative(name: &'static str, value: f64) -> HeightmapResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(HeightmapError::invalid_param(name, value, "must be a non-negative number"))
    }
}
