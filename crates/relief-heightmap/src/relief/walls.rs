//! Side walls joining the top surface to the base.

use nalgebra::{Point3, Vector3};
use tracing::debug;

use relief_mesh::{Mesh, Vertex};

use crate::grid::SampleGrid;
use crate::progress::Progress;

/// Boundary vertices of the sampled grid as `(column, row)`, walking
/// counter-clockwise seen from +z: front (+x), right (+y), back (−x), left (−y).
///
/// The loop is closed implicitly; the last point connects back to the first.
pub fn boundary_loop(columns: usize, rows: usize) -> Vec<(usize, usize)> {
    let mut points = Vec::with_capacity(2 * (columns - 1) + 2 * (rows - 1));
    points.extend((0..columns - 1).map(|c| (c, 0)));
    points.extend((0..rows - 1).map(|r| (columns - 1, r)));
    points.extend((1..columns).rev().map(|c| (c, rows - 1)));
    points.extend((1..rows).rev().map(|r| (0, r)));
    points
}

/// Append one quad per boundary edge, four fresh vertices each.
///
/// Returns the number of faces added.
pub fn add_walls(mesh: &mut Mesh, grid: &SampleGrid, progress: &Progress, band: (u8, u8)) -> usize {
    let boundary = boundary_loop(grid.columns, grid.rows);
    let n = boundary.len();
    debug!("Generating walls for {} boundary edges", n);

    let faces_before = mesh.face_count();
    for i in 0..n {
        let (c0, r0) = boundary[i];
        let (c1, r1) = boundary[(i + 1) % n];

        let top0 = grid.top_point(c0, r0);
        let top1 = grid.top_point(c1, r1);
        let bottom0 = grid.base_point(c0, r0);
        let bottom1 = grid.base_point(c1, r1);
        let normal = wall_normal(&top0, &top1, &bottom0, &bottom1);

        let v1 = mesh.push_vertex(Vertex::new(top0, normal));
        let v2 = mesh.push_vertex(Vertex::new(top1, normal));
        let v3 = mesh.push_vertex(Vertex::new(bottom0, normal));
        let v4 = mesh.push_vertex(Vertex::new(bottom1, normal));

        // Winding follows the walk direction so the faces look outward.
        mesh.faces.push([v1, v3, v2]);
        mesh.faces.push([v2, v3, v4]);

        progress.report_band(i + 1, n, band.0, band.1, "Building walls");
    }

    let added = mesh.face_count() - faces_before;
    debug!("Generated {} wall faces", added);
    added
}

/// Normal from the quad's edge vectors; falls back to the horizontal outward
/// direction when the wall has no height at its first corner.
fn wall_normal(top0: &Point3<f64>, top1: &Point3<f64>, bottom0: &Point3<f64>, bottom1: &Point3<f64>) -> Vector3<f64> {
    let down = bottom0 - top0;
    let along = top1 - top0;
    down.cross(&along).try_normalize(1e-12).unwrap_or_else(|| {
        let dir = bottom1 - bottom0;
        Vector3::new(dir.y, -dir.x, 0.0)
            .try_normalize(1e-12)
            .unwrap_or_else(Vector3::zeros)
    })
}
