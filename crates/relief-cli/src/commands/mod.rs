//! CLI command implementations.

pub mod generate;
pub mod quantize;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, info};

use relief_color::PixelBuffer;
use relief_pipeline::{JobEvent, LogLevel, Pipeline, PipelineConfig, QuantizeOutput};

use crate::output;
use crate::OutputFormat;

/// Quantization flags shared by `quantize` and `generate`.
#[derive(Args, Debug, Clone, Default)]
pub struct QuantizeOptions {
    /// Number of colors to reduce to (2-8)
    #[arg(short = 'k', long)]
    pub colors: Option<usize>,

    /// Target palette, comma-separated #RRGGBB colors (dark to light order is derived)
    #[arg(short, long, value_delimiter = ',')]
    pub palette: Option<Vec<String>>,

    /// Keep the discovered colors instead of substituting the palette
    #[arg(long)]
    pub no_remap: bool,

    /// Seed for reproducible clustering
    #[arg(long)]
    pub seed: Option<u64>,
}

impl QuantizeOptions {
    /// Override configuration values with the flags that were given.
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(k) = self.colors {
            config.palette.num_colors = k;
        }
        if let Some(palette) = &self.palette {
            config.palette.colors = palette.clone();
        }
        if self.no_remap {
            config.palette.remap = false;
        }
        if self.seed.is_some() {
            config.quantize.seed = self.seed;
        }
    }
}

/// Load the configuration file, or defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            let config = PipelineConfig::load(path)
                .with_context(|| format!("failed to load configuration {}", path.display()))?;
            info!("Using configuration {}", path.display());
            Ok(config)
        }
        None => Ok(PipelineConfig::default()),
    }
}

/// `relief config`: show what a run would use.
pub fn print_config(config: &PipelineConfig, format: OutputFormat) -> Result<()> {
    let text = match format {
        OutputFormat::Text => config.to_toml()?,
        OutputFormat::Json => config.to_json()?,
    };
    println!("{}", text);
    Ok(())
}

/// Show one job event to the user.
pub fn forward_event<T>(event: &JobEvent<T>, stage: &str, format: OutputFormat, quiet: bool) {
    match event {
        JobEvent::Log {
            level: LogLevel::Warn,
            message,
            ..
        } => output::warning(message, format, quiet),
        JobEvent::Log { message, data, .. } => match data {
            Some(data) => debug!("{}: {}", message, data),
            None => debug!("{}", message),
        },
        JobEvent::Progress { percentage } => output::progress(stage, *percentage, format, quiet),
        JobEvent::Result(_) | JobEvent::Error(_) => {}
    }
}

/// Run a quantization job for `pixels` with the pipeline's configured palette.
pub fn quantize_photo(
    pipeline: &Pipeline,
    pixels: PixelBuffer,
    format: OutputFormat,
    quiet: bool,
) -> Result<QuantizeOutput> {
    let handle = pipeline.submit_quantize(pipeline.quantize_request(pixels))?;
    let output = handle
        .wait_with(|event| forward_event(event, "Quantizing", format, quiet))
        .context("quantization failed")?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let mut config = PipelineConfig::default();
        let options = QuantizeOptions {
            colors: Some(6),
            palette: Some(vec!["#ffffff".into(), "#000000".into()]),
            no_remap: true,
            seed: Some(11),
        };
        options.apply(&mut config);

        assert_eq!(config.palette.num_colors, 6);
        assert_eq!(config.palette.colors, vec!["#ffffff", "#000000"]);
        assert!(!config.palette.remap);
        assert_eq!(config.quantize.seed, Some(11));
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let mut config = PipelineConfig::default();
        config.quantize.seed = Some(3);
        QuantizeOptions::default().apply(&mut config);
        assert_eq!(config, {
            let mut expected = PipelineConfig::default();
            expected.quantize.seed = Some(3);
            expected
        });
    }
}
