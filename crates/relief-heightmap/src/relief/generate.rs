//! Relief generation.
//!
//! Builds a closed solid from a palette-indexed image: a stepped top surface
//! whose height follows palette rank, a flat base at `z = 0`, and walls around
//! the outline.

use serde::Serialize;
use tracing::info;

use relief_color::QuantizedImage;
use relief_mesh::Mesh;

use super::surface::{add_surface, Side};
use super::walls::add_walls;
use crate::error::{HeightmapError, HeightmapResult};
use crate::grid::SampleGrid;
use crate::params::MeshParams;
use crate::progress::Progress;

const TOP_BAND: (u8, u8) = (0, 50);
const BASE_BAND: (u8, u8) = (50, 80);
const WALL_BAND: (u8, u8) = (80, 95);

/// Result of relief generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReliefStats {
    /// Grid size after applying resolution.
    pub grid_width: usize,
    pub grid_height: usize,
    /// Sampled vertex columns and rows after applying simplification.
    pub columns: usize,
    pub rows: usize,
    pub top_face_count: usize,
    pub base_face_count: usize,
    pub wall_face_count: usize,
    /// Samples that matched no palette entry.
    pub unmatched_samples: usize,
    /// Tallest point of the top surface in mm.
    pub max_height_mm: f64,
}

/// Generate the relief solid for `image`.
///
/// # Arguments
/// * `image` - Palette-indexed image; rank `i` stands `i` layers above the base
/// * `params` - Physical size and sampling parameters
/// * `progress` - Receives 0–95 % while meshing
///
/// # Returns
/// A tuple of (mesh, generation stats).
pub fn generate_relief(
    image: &QuantizedImage,
    params: &MeshParams,
    progress: &Progress,
) -> HeightmapResult<(Mesh, ReliefStats)> {
    info!(
        "Generating relief {:.1}x{:.1}mm, base {:.2}mm, layer {:.2}mm",
        params.object_width_mm, params.object_height_mm, params.base_height_mm, params.layer_height_mm
    );

    let grid = SampleGrid::sample(image, params)?;
    let (vertex_count, face_count) = expected_counts(grid.columns, grid.rows);
    if vertex_count > u32::MAX as usize {
        return Err(HeightmapError::TooManyVertices { count: vertex_count });
    }

    let mut mesh = Mesh::with_capacity(vertex_count, face_count);
    progress.report(TOP_BAND.0, "Building top surface");
    let top_face_count = add_surface(&mut mesh, &grid, Side::Top, progress, TOP_BAND);
    let base_face_count = add_surface(&mut mesh, &grid, Side::Base, progress, BASE_BAND);
    let wall_face_count = add_walls(&mut mesh, &grid, progress, WALL_BAND);

    let max_height_mm = mesh
        .vertices
        .iter()
        .map(|v| v.position.z)
        .fold(0.0, f64::max);

    info!(
        "Relief generation complete: {} vertices, {} faces",
        mesh.vertex_count(),
        mesh.face_count()
    );

    let stats = ReliefStats {
        grid_width: grid.grid_width,
        grid_height: grid.grid_height,
        columns: grid.columns,
        rows: grid.rows,
        top_face_count,
        base_face_count,
        wall_face_count,
        unmatched_samples: grid.unmatched,
        max_height_mm,
    };

    Ok((mesh, stats))
}

/// Vertex and face counts for a `columns` x `rows` sampled grid.
pub fn expected_counts(columns: usize, rows: usize) -> (usize, usize) {
    let cells = (columns - 1) * (rows - 1);
    let edges = 2 * (columns - 1) + 2 * (rows - 1);
    let vertices = 2 * columns * rows + 4 * edges;
    let faces = 2 * 2 * cells + 2 * edges;
    (vertices, faces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relief_color::{Palette, PixelBuffer, Rgb};
    use relief_mesh::{binary_stl_size, serialize, validate_mesh};
    use std::sync::{Arc, Mutex};

    fn indexed(width: u32, height: u32, rank: impl Fn(u32, u32) -> usize) -> QuantizedImage {
        let palette = vec![
            Rgb::new(0, 0, 0),
            Rgb::new(255, 0, 0),
            Rgb::new(255, 0, 255),
            Rgb::new(255, 165, 0),
        ];
        let colors: Vec<Rgb> = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| palette[rank(x, y) % palette.len()])
            .collect();
        let pixels = PixelBuffer::from_colors(width, height, colors).unwrap();
        QuantizedImage::from_pixels(pixels, Palette::new(palette).unwrap())
    }

    #[test]
    fn test_uniform_two_by_two() {
        let image = indexed(2, 2, |_, _| 0);
        let params = MeshParams {
            object_width_mm: 10.0,
            object_height_mm: 10.0,
            base_height_mm: 5.0,
            layer_height_mm: 1.0,
            resolution: 1.0,
            simplification_level: 0,
        };
        let (mesh, stats) = generate_relief(&image, &params, &Progress::none()).unwrap();

        let top = &mesh.vertices[0..4];
        let base = &mesh.vertices[4..8];
        assert!(top.iter().all(|v| v.position.z == 5.0));
        assert!(base.iter().all(|v| v.position.z == 0.0));
        assert_eq!(mesh.vertices[3].position.x, 10.0);
        assert_eq!(mesh.vertices[3].position.y, 10.0);

        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.face_count(), 12);
        assert_eq!((stats.top_face_count, stats.base_face_count, stats.wall_face_count), (2, 2, 8));
        assert_eq!(serialize(&mesh).unwrap().len(), 684);
        assert_eq!(binary_stl_size(mesh.face_count()), 684);
    }

    #[test]
    fn test_solid_is_closed_and_consistently_wound() {
        let image = indexed(7, 5, |x, y| ((x * 3 + y * 5) % 4) as usize);
        let (mesh, _) = generate_relief(&image, &MeshParams::default(), &Progress::none()).unwrap();

        let report = validate_mesh(&mesh);
        assert!(report.is_watertight(), "{report}");
        assert!(report.is_manifold(), "{report}");
        assert!(report.is_consistently_wound(), "{report}");
        assert_eq!(report.degenerate_face_count, 0);
    }

    #[test]
    fn test_heights_follow_rank() {
        let image = indexed(3, 2, |x, _| x as usize);
        let (mesh, stats) = generate_relief(&image, &MeshParams::default(), &Progress::none()).unwrap();

        let top_z: Vec<f64> = mesh.vertices[0..3].iter().map(|v| v.position.z).collect();
        assert_eq!(top_z, vec![5.0, 6.0, 7.0]);
        assert_eq!(stats.max_height_mm, 7.0);
    }

    #[test]
    fn test_walls_face_outward() {
        let image = indexed(4, 4, |x, y| (x + y) as usize);
        let (mesh, stats) = generate_relief(&image, &MeshParams::default(), &Progress::none()).unwrap();
        let center = nalgebra::Point3::new(35.0, 20.0, 0.0);

        let first_wall = stats.top_face_count + stats.base_face_count;
        for face in first_wall..mesh.face_count() {
            let tri = mesh.triangle(face).unwrap();
            let normal = tri.normal().unwrap();
            let outward = tri.v0 - center;
            assert!(normal.z.abs() < 1e-9);
            assert!(normal.x * outward.x + normal.y * outward.y > 0.0);
        }
    }

    #[test]
    fn test_simplification_reduces_triangles() {
        let image = indexed(33, 17, |x, y| (x / 4 + y / 4) as usize);
        let faces: Vec<usize> = (0..=3)
            .map(|level| {
                let params = MeshParams {
                    simplification_level: level,
                    ..MeshParams::default()
                };
                generate_relief(&image, &params, &Progress::none()).unwrap().0.face_count()
            })
            .collect();

        assert!(faces.windows(2).all(|w| w[1] < w[0]), "{faces:?}");

        let params = MeshParams {
            simplification_level: 2,
            ..MeshParams::default()
        };
        let (mesh, stats) = generate_relief(&image, &params, &Progress::none()).unwrap();
        assert_eq!((stats.columns, stats.rows), (9, 5));
        assert_eq!((mesh.vertex_count(), mesh.face_count()), expected_counts(9, 5));
        assert!(validate_mesh(&mesh).is_watertight());
    }

    #[test]
    fn test_progress_rises_to_wall_band_end() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress = Progress::new(move |p, _| sink.lock().unwrap().push(p));

        let image = indexed(10, 6, |x, _| x as usize);
        generate_relief(&image, &MeshParams::default(), &progress).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&95));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_too_small_image_is_rejected() {
        let image = indexed(1, 1, |_, _| 0);
        assert!(matches!(
            generate_relief(&image, &MeshParams::default(), &Progress::none()),
            Err(HeightmapError::GridTooSmall { .. })
        ));
    }
}
