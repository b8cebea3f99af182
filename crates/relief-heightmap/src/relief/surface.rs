//! Top and base surfaces of the relief.
//!
//! Both are regular grids over the sampled vertices, two triangles per cell.
//! With `a = (c, r)`, `b = (c+1, r)`, `c' = (c, r+1)`, `d = (c+1, r+1)` the top
//! uses `(a, b, c')`, `(b, d, c')` (counter-clockwise seen from +z) and the
//! base uses the reverse.

use nalgebra::Vector3;
use tracing::debug;

use relief_mesh::{Mesh, Vertex};

use crate::grid::SampleGrid;
use crate::progress::Progress;

/// Which side of the solid a surface closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Base,
}

impl Side {
    fn normal(self) -> Vector3<f64> {
        match self {
            Side::Top => Vector3::z(),
            Side::Base => -Vector3::z(),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Side::Top => "Building top surface",
            Side::Base => "Building base",
        }
    }
}

/// Append one surface grid to `mesh`, reporting rows into `band`.
///
/// Returns the number of faces added.
pub fn add_surface(mesh: &mut Mesh, grid: &SampleGrid, side: Side, progress: &Progress, band: (u8, u8)) -> usize {
    let cols = grid.columns;
    let rows = grid.rows;
    let offset = mesh.vertex_count() as u32;
    let normal = side.normal();

    for r in 0..rows {
        for c in 0..cols {
            let position = match side {
                Side::Top => grid.top_point(c, r),
                Side::Base => grid.base_point(c, r),
            };
            mesh.vertices.push(Vertex::new(position, normal));
        }
    }

    let faces_before = mesh.face_count();
    let cols32 = cols as u32;
    for r in 0..rows - 1 {
        for c in 0..cols - 1 {
            let a = offset + (r * cols + c) as u32;
            let b = a + 1;
            let below = a + cols32;
            let d = below + 1;
            match side {
                Side::Top => {
                    mesh.faces.push([a, b, below]);
                    mesh.faces.push([b, d, below]);
                }
                Side::Base => {
                    mesh.faces.push([a, below, b]);
                    mesh.faces.push([b, below, d]);
                }
            }
        }
        progress.report_band(r + 1, rows - 1, band.0, band.1, side.label());
    }

    let added = mesh.face_count() - faces_before;
    debug!("{:?} surface: {} vertices, {} faces", side, cols * rows, added);
    added
}
