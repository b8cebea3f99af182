//! Background orchestration of the photo-to-relief pipeline.
//!
//! Two workers run off the caller's thread, one per stage:
//!
//! - **Quantizer**: pixels → k colors → optional palette substitution
//! - **Mesher**: palette-indexed image → solid → binary STL
//!
//! Every submission gets a [`JobId`] and a [`JobHandle`] that receives that
//! job's log and progress events followed by exactly one result or error.
//!
//! # Example
//!
//! ```
//! use relief_color::{PixelBuffer, Rgb};
//! use relief_pipeline::{MeshRequest, Pipeline, PipelineConfig, QuantizeRequest};
//!
//! let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
//! let pixels = PixelBuffer::from_colors(2, 2, [Rgb::BLACK, Rgb::WHITE, Rgb::WHITE, Rgb::BLACK]).unwrap();
//!
//! let quantized = pipeline
//!     .submit_quantize(QuantizeRequest::new(pixels, 2))
//!     .unwrap()
//!     .wait()
//!     .unwrap();
//!
//! let mesh = pipeline
//!     .submit_mesh(MeshRequest::new(quantized.image, Default::default()))
//!     .unwrap()
//!     .wait()
//!     .unwrap();
//! assert_eq!(mesh.stl.len(), 84 + 50 * mesh.triangle_count);
//! ```

mod config;
mod error;
mod events;
mod jobs;
mod worker;

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use relief_color::{PixelBuffer, QuantizedImage};

pub use config::{PaletteConfig, PipelineConfig, QuantizeConfig};
pub use error::{ErrorKind, JobFailure, PipelineError, PipelineResult};
pub use events::{JobContext, JobEvent, JobId, LogLevel};
pub use jobs::{MeshOutput, MeshRequest, QuantizeOutput, QuantizeRequest};
pub use worker::{Job, JobHandle, Worker};

/// The two pipeline workers and the job id counter they share.
///
/// Dropping the pipeline finishes queued jobs, then stops both threads.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    next_id: AtomicU64,
    quantizer: Worker<QuantizeRequest>,
    mesher: Worker<MeshRequest>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        let quantizer = Worker::spawn("quantize", config.quantize.clone())?;
        let mesher = Worker::spawn("mesh", ())?;
        debug!("Pipeline workers started");
        Ok(Self {
            config,
            next_id: AtomicU64::new(1),
            quantizer,
            mesher,
        })
    }

    #[inline]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn next_id(&self) -> JobId {
        JobId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn submit_quantize(&self, request: QuantizeRequest) -> PipelineResult<JobHandle<QuantizeOutput>> {
        self.quantizer.submit(self.next_id(), request)
    }

    pub fn submit_mesh(&self, request: MeshRequest) -> PipelineResult<JobHandle<MeshOutput>> {
        self.mesher.submit(self.next_id(), request)
    }

    /// Quantization request built from the configured palette section.
    pub fn quantize_request(&self, pixels: PixelBuffer) -> QuantizeRequest {
        let palette = &self.config.palette;
        QuantizeRequest {
            pixels,
            k: palette.num_colors,
            target_palette: palette.colors.clone(),
            remap: palette.remap,
        }
    }

    /// Mesh request using the configured mesh parameters.
    pub fn mesh_request(&self, image: QuantizedImage) -> MeshRequest {
        MeshRequest::new(image, self.config.mesh.clone())
    }
}
