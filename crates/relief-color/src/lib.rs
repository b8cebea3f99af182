//! Color reduction for photo reliefs.
//!
//! Turns an RGBA photo into a handful of flat colors, each of which becomes
//! one print layer:
//!
//! - **Quantization**: k-means over RGB space, seeded from the image's own colors
//! - **Remapping**: substitute the discovered colors with a chosen palette,
//!   keeping dark-to-light order
//! - **Palettes**: ordered colors where position is layer height
//!
//! # Example
//!
//! ```
//! use relief_color::{quantize, remap, KMeansParams, PixelBuffer, Rgb};
//!
//! let pixels = PixelBuffer::from_colors(2, 1, [Rgb::new(10, 10, 10), Rgb::new(240, 240, 240)]).unwrap();
//! let q = quantize(&pixels, &KMeansParams::with_k(2).seeded(1)).unwrap();
//! let image = q.to_image(&pixels).unwrap();
//!
//! let out = remap(image, &[Rgb::WHITE, Rgb::BLACK]).unwrap();
//! assert_eq!(out.image.palette().colors(), &[Rgb::BLACK, Rgb::WHITE]);
//! ```

mod color;
mod error;
mod palette;
mod pixels;

pub mod quantize;
pub mod remap;

pub use color::{Rgb, RgbF};
pub use error::{ColorError, ColorResult};
pub use palette::{Palette, PaletteEntry, QuantizedImage, MAX_PALETTE_LEN};
pub use pixels::{PixelBuffer, CHANNELS};

pub use quantize::{
    quantize, quantize_observed, IterationStats, KMeansParams, Quantization, MAX_CLUSTERS, MIN_CLUSTERS,
};
pub use remap::{remap, sort_by_luminance, target_rank, ColorMapping, Remapping};
