//! Quantize command implementation.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use relief_color::ColorMapping;
use relief_pipeline::{Pipeline, PipelineConfig};

use super::{quantize_photo, QuantizeOptions};
use crate::input::{load_photo, save_pixels};
use crate::output;
use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct QuantizeArgs {
    /// Input photo (PNG or JPEG)
    pub input: PathBuf,

    /// Output image (default: <input>.quantized.png)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub options: QuantizeOptions,
}

#[derive(Serialize)]
struct QuantizeSummary {
    input: PathBuf,
    output: PathBuf,
    width: u32,
    height: u32,
    palette: Vec<String>,
    centroids: Vec<String>,
    iterations: usize,
    converged: bool,
    mapping: Option<Vec<ColorMapping>>,
}

pub fn run(args: &QuantizeArgs, mut config: PipelineConfig, format: OutputFormat, quiet: bool) -> Result<()> {
    args.options.apply(&mut config);
    config.validate()?;

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("quantized.png"));

    let pixels = load_photo(&args.input)?;
    let pipeline = Pipeline::new(config)?;
    let result = quantize_photo(&pipeline, pixels, format, quiet)?;
    save_pixels(result.pixels(), &output_path)?;

    let summary = QuantizeSummary {
        input: args.input.clone(),
        output: output_path,
        width: result.pixels().width(),
        height: result.pixels().height(),
        palette: result.palette,
        centroids: result.centroids,
        iterations: result.iterations,
        converged: result.converged,
        mapping: result.mapping,
    };

    output::success(
        &format!(
            "Quantized {} to {} colors in {} iterations",
            summary.input.display(),
            summary.centroids.len(),
            summary.iterations
        ),
        format,
        quiet,
    );
    output::info(&format!("  Palette: {}", summary.palette.join(" ")), format, quiet);
    if let Some(mapping) = &summary.mapping {
        for m in mapping {
            output::info(&format!("  {} -> {}", m.from, m.to), format, quiet);
        }
    }
    output::info(&format!("  Wrote {}", summary.output.display()), format, quiet);
    output::print(&summary, format, quiet);

    Ok(())
}
