//! Quantization job: cluster, rebuild the image, optionally remap.

use serde_json::json;

use relief_color::{quantize_observed, remap, ColorMapping, Palette, PixelBuffer, QuantizedImage};

use crate::config::QuantizeConfig;
use crate::error::PipelineResult;
use crate::events::JobContext;
use crate::worker::Job;

/// Request to reduce an image to `k` colors.
#[derive(Debug, Clone)]
pub struct QuantizeRequest {
    pub pixels: PixelBuffer,
    pub k: usize,
    /// `#RRGGBB` colors to substitute for the discovered ones.
    pub target_palette: Vec<String>,
    /// Whether to substitute at all.
    pub remap: bool,
}

impl QuantizeRequest {
    /// Quantize without remapping.
    pub fn new(pixels: PixelBuffer, k: usize) -> Self {
        Self {
            pixels,
            k,
            target_palette: Vec::new(),
            remap: false,
        }
    }

    /// Remap onto `palette` after quantizing.
    pub fn with_palette<S: Into<String>>(mut self, palette: impl IntoIterator<Item = S>) -> Self {
        self.target_palette = palette.into_iter().map(Into::into).collect();
        self.remap = true;
        self
    }
}

/// Result of a quantization job.
#[derive(Debug, Clone)]
pub struct QuantizeOutput {
    /// Final pixels, palette and per-pixel ranks.
    pub image: QuantizedImage,
    /// Final palette as lower-case `#rrggbb`, in layer order.
    pub palette: Vec<String>,
    /// Centroid-to-target substitutions, when remapping ran.
    pub mapping: Option<Vec<ColorMapping>>,
    /// Raw centroids as `#rrggbb`, in clustering order.
    pub centroids: Vec<String>,
    pub iterations: usize,
    pub converged: bool,
}

impl QuantizeOutput {
    #[inline]
    pub fn pixels(&self) -> &PixelBuffer {
        self.image.pixels()
    }
}

impl Job for QuantizeRequest {
    type Output = QuantizeOutput;
    type Settings = QuantizeConfig;

    fn run(self, settings: &QuantizeConfig, ctx: &JobContext<QuantizeOutput>) -> PipelineResult<QuantizeOutput> {
        let params = settings.params(self.k);
        params.validate()?;

        ctx.info(
            "Starting color quantization",
            json!({
                "width": self.pixels.width(),
                "height": self.pixels.height(),
                "k": self.k,
            }),
        );

        let cap = params.max_iterations;
        let quantization = quantize_observed(&self.pixels, &params, &mut |stats| {
            ctx.debug(
                format!("Iteration {}", stats.iteration),
                json!({ "inertia": stats.inertia, "max_shift": stats.max_shift }),
            );
            ctx.progress(((stats.iteration * 100) / cap).min(99) as u8);
        })?;

        if quantization.is_padded() {
            ctx.warn(format!(
                "Image has only {} distinct colors; duplicated centroids to reach {}",
                quantization.distinct_seeds, self.k
            ));
        }
        if !quantization.converged {
            ctx.warn(format!(
                "Clustering did not converge within {} iterations; using last centroids",
                cap
            ));
        }

        let centroids: Vec<String> = quantization.centroids.iter().map(|c| c.to_hex()).collect();
        ctx.info(
            "Quantization complete",
            json!({ "iterations": quantization.iterations, "centroids": centroids }),
        );

        let image = quantization.to_image(&self.pixels)?;
        let (image, mapping) = if self.remap {
            let target = Palette::from_hex_lenient(&self.target_palette);
            let dropped = self.target_palette.len() - target.len();
            if dropped > 0 {
                ctx.warn(format!("Ignored {} invalid target palette entries", dropped));
            }

            if target.is_empty() {
                ctx.warn("Target palette is empty or invalid; keeping quantized colors");
                (image, None)
            } else {
                let remapped = remap(image, &target)?;
                ctx.debug("Color mapping", serde_json::to_value(&remapped.mapping)?);
                (remapped.image, Some(remapped.mapping))
            }
        } else {
            (image, None)
        };

        ctx.progress(100);

        Ok(QuantizeOutput {
            palette: image.palette().to_hex(),
            image,
            mapping,
            centroids,
            iterations: quantization.iterations,
            converged: quantization.converged,
        })
    }
}
