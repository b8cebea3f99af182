//! Pipeline configuration.
//!
//! Loaded from TOML; every field is optional and falls back to the defaults
//! shown here.
//!
//! ```toml
//! [quantize]
//! max_iterations = 100
//! convergence_epsilon = 1.0
//! seed = 42
//!
//! [mesh]
//! object_width_mm = 70.0
//! object_height_mm = 40.0
//! base_height_mm = 5.0
//! layer_height_mm = 1.0
//! resolution = 1.0
//! simplification_level = 0
//!
//! [palette]
//! colors = ["#000000", "#FF0000", "#FF00FF", "#FFA500"]
//! remap = true
//! num_colors = 4
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use relief_color::KMeansParams;
use relief_heightmap::MeshParams;

use crate::error::{PipelineError, PipelineResult};

/// Clustering settings shared by every quantization job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantizeConfig {
    pub max_iterations: usize,
    pub convergence_epsilon: f64,
    /// Fixed seed for reproducible centroids.
    pub seed: Option<u64>,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        let params = KMeansParams::default();
        Self {
            max_iterations: params.max_iterations,
            convergence_epsilon: params.convergence_epsilon,
            seed: params.seed,
        }
    }
}

impl QuantizeConfig {
    /// Clustering parameters for `k` clusters.
    pub fn params(&self, k: usize) -> KMeansParams {
        KMeansParams {
            k,
            max_iterations: self.max_iterations,
            convergence_epsilon: self.convergence_epsilon,
            seed: self.seed,
        }
    }
}

/// Target palette and color count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    /// `#RRGGBB` colors, one per print filament.
    pub colors: Vec<String>,
    /// Substitute discovered colors with `colors`.
    pub remap: bool,
    /// Number of colors to quantize to.
    pub num_colors: usize,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            colors: ["#000000", "#FF0000", "#FF00FF", "#FFA500"]
                .into_iter()
                .map(String::from)
                .collect(),
            remap: true,
            num_colors: 4,
        }
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub quantize: QuantizeConfig,
    pub mesh: MeshParams,
    pub palette: PaletteConfig,
}

impl PipelineConfig {
    pub fn from_toml(text: &str) -> PipelineResult<Self> {
        let config: Self = toml::from_str(text)?;
        Ok(config)
    }

    pub fn to_toml(&self) -> PipelineResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn to_json(&self) -> PipelineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Check every section without running anything.
    pub fn validate(&self) -> PipelineResult<()> {
        self.quantize.params(self.palette.num_colors).validate()?;
        self.mesh.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_front_end() {
        let config = PipelineConfig::default();
        assert_eq!(config.quantize.max_iterations, 100);
        assert_eq!(config.quantize.convergence_epsilon, 1.0);
        assert_eq!(config.quantize.seed, None);
        assert_eq!(config.mesh.object_width_mm, 70.0);
        assert_eq!(config.palette.colors.len(), 4);
        assert!(config.palette.remap);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
            [quantize]
            seed = 42

            [mesh]
            base_height_mm = 2.5
            "#,
        )
        .unwrap();

        assert_eq!(config.quantize.seed, Some(42));
        assert_eq!(config.quantize.max_iterations, 100);
        assert_eq!(config.mesh.base_height_mm, 2.5);
        assert_eq!(config.mesh.layer_height_mm, 1.0);
        assert_eq!(config.palette.num_colors, 4);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = PipelineConfig::default();
        config.quantize.seed = Some(9);
        config.mesh.simplification_level = 2;

        let text = config.to_toml().unwrap();
        assert_eq!(PipelineConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_malformed_toml_is_invalid_input() {
        let err = PipelineConfig::from_toml("[mesh]\nresolution = \"high\"").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_validate_rejects_bad_sections() {
        let mut config = PipelineConfig::default();
        config.palette.num_colors = 12;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.mesh.resolution = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relief.toml");
        std::fs::write(&path, "[palette]\nnum_colors = 6\n").unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.palette.num_colors, 6);

        let missing = PipelineConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert_eq!(missing.kind(), crate::ErrorKind::Internal);
    }
}
