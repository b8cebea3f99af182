//! Mesh job: heightmap to solid to binary STL.

use std::path::Path;
use std::time::Instant;

use serde_json::json;

use relief_color::{Palette, PixelBuffer, QuantizedImage};
use relief_heightmap::{generate_relief, MeshParams, ReliefStats};
use relief_mesh::{log_validation, serialize, validate_mesh, MeshReport};

use crate::error::{PipelineError, PipelineResult};
use crate::events::JobContext;
use crate::worker::Job;

/// Request to turn a palette-indexed image into a binary STL.
#[derive(Debug, Clone)]
pub struct MeshRequest {
    pub image: QuantizedImage,
    pub params: MeshParams,
}

impl MeshRequest {
    pub fn new(image: QuantizedImage, params: MeshParams) -> Self {
        Self { image, params }
    }

    /// Build from pixels and a `#RRGGBB` palette received from outside.
    ///
    /// Palette ranks are recovered once here by exact color lookup.
    pub fn from_hex<S: AsRef<str>>(pixels: PixelBuffer, palette: &[S], params: MeshParams) -> PipelineResult<Self> {
        let palette = Palette::from_hex(palette)?;
        Ok(Self::new(QuantizedImage::from_pixels(pixels, palette), params))
    }
}

/// Result of a mesh job.
#[derive(Debug, Clone)]
pub struct MeshOutput {
    /// Binary STL, exactly `84 + 50 * triangle_count` bytes.
    pub stl: Vec<u8>,
    pub triangle_count: usize,
    pub vertex_count: usize,
    /// Wall time spent meshing and encoding.
    pub generation_time_seconds: f64,
    /// `stl.len()` in MiB.
    pub file_size_mb: f64,
    pub stats: ReliefStats,
    pub report: MeshReport,
}

impl MeshOutput {
    /// Write the STL bytes to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> PipelineResult<()> {
        let path = path.as_ref();
        std::fs::write(path, &self.stl).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Job for MeshRequest {
    type Output = MeshOutput;
    type Settings = ();

    fn run(self, _settings: &(), ctx: &JobContext<MeshOutput>) -> PipelineResult<MeshOutput> {
        let start = Instant::now();
        self.params.validate()?;

        ctx.info("Starting mesh generation", serde_json::to_value(&self.params)?);
        let progress = ctx.progress_reporter();
        let (mesh, stats) = generate_relief(&self.image, &self.params, &progress)?;

        if stats.unmatched_samples > 0 {
            ctx.warn(format!(
                "{} samples matched no palette color and sit at base height",
                stats.unmatched_samples
            ));
        }
        ctx.debug("Mesh generated", serde_json::to_value(&stats)?);

        let report = validate_mesh(&mesh);
        log_validation(&report);
        if !report.is_printable() {
            ctx.warn(format!(
                "Mesh is not printable: {} boundary edges, {} non-manifold edges, {} inconsistent edges",
                report.boundary_edge_count, report.non_manifold_edge_count, report.inconsistent_edge_count
            ));
        }

        ctx.info("Encoding binary STL", json!({ "triangles": mesh.face_count() }));
        let stl = serialize(&mesh)?;
        ctx.progress(100);

        let generation_time_seconds = start.elapsed().as_secs_f64();
        let file_size_mb = stl.len() as f64 / (1024.0 * 1024.0);
        ctx.info(
            "Mesh ready",
            json!({
                "generation_time_seconds": generation_time_seconds,
                "file_size_mb": file_size_mb,
            }),
        );

        Ok(MeshOutput {
            triangle_count: mesh.face_count(),
            vertex_count: mesh.vertex_count(),
            stl,
            generation_time_seconds,
            file_size_mb,
            stats,
            report,
        })
    }
}
