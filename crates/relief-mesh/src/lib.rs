//! Triangle mesh model for photo reliefs.
//!
//! This crate holds the mesh produced by the heightmap mesher and everything
//! that happens to it afterwards:
//!
//! - **Model**: indexed vertices with per-vertex normals and triangle faces
//! - **Serialization**: fixed-layout binary STL, byte-exact `84 + 50·T`
//! - **Validation**: closure, manifoldness and winding checks before printing
//!
//! # Example
//!
//! ```
//! use relief_mesh::{serialize, Mesh, Vertex};
//!
//! let mut mesh = Mesh::new();
//! mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
//! mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
//! mesh.faces.push([0, 1, 2]);
//!
//! let bytes = serialize(&mesh).unwrap();
//! assert_eq!(bytes.len(), 84 + 50);
//! ```

mod error;
mod types;

pub mod adjacency;
pub mod stl;
pub mod validate;

// Re-export core types at crate root
pub use error::{MeshError, MeshResult};
pub use types::{Mesh, Triangle, Vertex};

pub use adjacency::MeshAdjacency;
pub use stl::{binary_stl_size, save_stl, serialize, write_binary_stl};
pub use validate::{log_validation, validate_mesh, MeshReport};

