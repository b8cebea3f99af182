//! Generate command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use relief_pipeline::{Pipeline, PipelineConfig};

use super::{forward_event, quantize_photo, QuantizeOptions};
use crate::input::{load_photo, save_pixels};
use crate::output;
use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Input photo (PNG or JPEG)
    pub input: PathBuf,

    /// Output STL file (default: <input>.stl)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub options: QuantizeOptions,

    /// Object width in mm
    #[arg(long)]
    pub width: Option<f64>,

    /// Object height (Y extent) in mm
    #[arg(long)]
    pub height: Option<f64>,

    /// Base thickness in mm
    #[arg(long)]
    pub base: Option<f64>,

    /// Height added per color layer in mm
    #[arg(long)]
    pub layer: Option<f64>,

    /// Fraction of pixels used per axis (0-1]
    #[arg(long)]
    pub resolution: Option<f64>,

    /// Simplification level 0-3 (sample every 2^level cells)
    #[arg(long)]
    pub simplify: Option<u8>,

    /// Also save the quantized image
    #[arg(long)]
    pub save_quantized: Option<PathBuf>,
}

impl GenerateArgs {
    fn apply(&self, config: &mut PipelineConfig) {
        self.options.apply(config);
        let mesh = &mut config.mesh;
        if let Some(v) = self.width {
            mesh.object_width_mm = v;
        }
        if let Some(v) = self.height {
            mesh.object_height_mm = v;
        }
        if let Some(v) = self.base {
            mesh.base_height_mm = v;
        }
        if let Some(v) = self.layer {
            mesh.layer_height_mm = v;
        }
        if let Some(v) = self.resolution {
            mesh.resolution = v;
        }
        if let Some(v) = self.simplify {
            mesh.simplification_level = v;
        }
    }
}

#[derive(Serialize)]
struct GenerateSummary {
    input: PathBuf,
    output: PathBuf,
    quantized_image: Option<PathBuf>,
    palette: Vec<String>,
    triangles: usize,
    vertices: usize,
    file_size_mb: f64,
    generation_time_seconds: f64,
    dimensions_mm: Option<(f64, f64, f64)>,
    printable: bool,
    unmatched_samples: usize,
}

pub fn run(args: &GenerateArgs, mut config: PipelineConfig, format: OutputFormat, quiet: bool) -> Result<()> {
    args.apply(&mut config);
    config.validate()?;

    let output_path = args.output.clone().unwrap_or_else(|| args.input.with_extension("stl"));

    let pixels = load_photo(&args.input)?;
    let pipeline = Pipeline::new(config)?;
    let quantized = quantize_photo(&pipeline, pixels, format, quiet)?;

    if let Some(path) = &args.save_quantized {
        save_pixels(quantized.pixels(), path)?;
    }

    let handle = pipeline.submit_mesh(pipeline.mesh_request(quantized.image))?;
    let mesh = handle
        .wait_with(|event| forward_event(event, "Building mesh", format, quiet))
        .context("mesh generation failed")?;
    mesh.save(&output_path)?;

    let summary = GenerateSummary {
        input: args.input.clone(),
        output: output_path,
        quantized_image: args.save_quantized.clone(),
        palette: quantized.palette,
        triangles: mesh.triangle_count,
        vertices: mesh.vertex_count,
        file_size_mb: mesh.file_size_mb,
        generation_time_seconds: mesh.generation_time_seconds,
        dimensions_mm: mesh.report.dimensions,
        printable: mesh.report.is_printable(),
        unmatched_samples: mesh.stats.unmatched_samples,
    };

    output::success(
        &format!(
            "Wrote {} ({} triangles, {:.2} MB) in {:.2}s",
            summary.output.display(),
            summary.triangles,
            summary.file_size_mb,
            summary.generation_time_seconds
        ),
        format,
        quiet,
    );
    output::info(&format!("  Layers (bottom to top): {}", summary.palette.join(" ")), format, quiet);
    if let Some((x, y, z)) = summary.dimensions_mm {
        output::info(&format!("  Size: {:.1} x {:.1} x {:.1} mm", x, y, z), format, quiet);
    }
    if !summary.printable {
        output::warning("Mesh failed the printability check; see log for details", format, quiet);
    }
    output::print(&summary, format, quiet);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> GenerateArgs {
        GenerateArgs {
            input: PathBuf::from("photo.png"),
            output: None,
            options: QuantizeOptions::default(),
            width: None,
            height: None,
            base: None,
            layer: None,
            resolution: None,
            simplify: None,
            save_quantized: None,
        }
    }

    #[test]
    fn test_mesh_flags_override_config() {
        let mut config = PipelineConfig::default();
        let args = GenerateArgs {
            width: Some(100.0),
            base: Some(2.0),
            simplify: Some(2),
            ..args()
        };
        args.apply(&mut config);

        assert_eq!(config.mesh.object_width_mm, 100.0);
        assert_eq!(config.mesh.object_height_mm, 40.0);
        assert_eq!(config.mesh.base_height_mm, 2.0);
        assert_eq!(config.mesh.simplification_level, 2);
    }

    #[test]
    fn test_writes_stl_next_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("photo.png");
        let img = image::RgbaImage::from_fn(12, 8, |x, y| image::Rgba([(x * 20) as u8, (y * 30) as u8, 90, 255]));
        img.save(&input).unwrap();

        let args = GenerateArgs {
            input: input.clone(),
            options: QuantizeOptions {
                seed: Some(5),
                ..QuantizeOptions::default()
            },
            ..args()
        };
        run(&args, PipelineConfig::default(), OutputFormat::Json, true).unwrap();

        let stl = std::fs::read(input.with_extension("stl")).unwrap();
        let triangles = u32::from_le_bytes(stl[80..84].try_into().unwrap()) as usize;
        assert_eq!(stl.len(), 84 + 50 * triangles);
    }
}
