//! Heightmap meshing for photo reliefs.
//!
//! Each pixel's palette rank becomes a height: rank `i` stands `i` layers
//! above the base. The result is a closed solid ready for serialization:
//!
//! - **Top**: one vertex per sampled grid cell at its layer height
//! - **Base**: a flat copy at `z = 0`, wound the other way
//! - **Walls**: a quad per boundary edge joining the two
//!
//! # Example
//!
//! ```
//! use relief_color::{Palette, PixelBuffer, QuantizedImage, Rgb};
//! use relief_heightmap::{generate_relief, MeshParams, Progress};
//!
//! let pixels = PixelBuffer::filled(2, 2, Rgb::BLACK).unwrap();
//! let image = QuantizedImage::from_pixels(pixels, Palette::new(vec![Rgb::BLACK]).unwrap());
//!
//! let (mesh, stats) = generate_relief(&image, &MeshParams::default(), &Progress::none()).unwrap();
//! assert_eq!(mesh.face_count(), 12);
//! assert_eq!(stats.wall_face_count, 8);
//! ```

mod error;
mod grid;
mod params;
mod progress;

pub mod relief;

pub use error::{HeightmapError, HeightmapResult};
pub use grid::SampleGrid;
pub use params::{MeshParams, MAX_SIMPLIFICATION};
pub use progress::Progress;
pub use relief::{generate_relief, ReliefStats};
