//! Relief solid generation.
//!
//! Turns a sampled heightmap into a closed, consistently wound solid.

mod generate;
mod surface;
mod walls;

pub use generate::{expected_counts, generate_relief, ReliefStats};
pub use walls::boundary_loop;
