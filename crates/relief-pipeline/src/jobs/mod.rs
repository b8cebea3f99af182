//! The two job types a pipeline runs.

mod mesh;
mod quantize;

pub use mesh::{MeshOutput, MeshRequest};
pub use quantize::{QuantizeOutput, QuantizeRequest};
