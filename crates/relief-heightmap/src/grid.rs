//! Sampling a palette-indexed image onto the vertex grid.
//!
//! The image is first resized (conceptually) to `floor(w · resolution)` by
//! `floor(h · resolution)` grid cells, then every `skip`-th cell in each
//! direction becomes a vertex. Grid coordinate `g` reads source pixel
//! `floor(g / resolution)`.

use nalgebra::Point3;
use tracing::{debug, warn};

use relief_color::QuantizedImage;

use crate::error::{HeightmapError, HeightmapResult};
use crate::params::MeshParams;

/// Sampled heights on a regular grid, plus the mapping to millimeters.
#[derive(Debug, Clone)]
pub struct SampleGrid {
    /// Full grid width before striding.
    pub grid_width: usize,
    /// Full grid height before striding.
    pub grid_height: usize,
    /// Sampled vertex columns, `ceil(grid_width / skip)`.
    pub columns: usize,
    /// Sampled vertex rows, `ceil(grid_height / skip)`.
    pub rows: usize,
    /// Grid cells between neighboring vertices.
    pub skip: usize,
    /// Millimeters per grid cell along X.
    pub scale_x: f64,
    /// Millimeters per grid cell along Y.
    pub scale_y: f64,
    /// Samples whose pixel matched no palette entry.
    pub unmatched: usize,
    heights: Vec<f64>,
}

impl SampleGrid {
    /// Sample `image` at the stride and resolution given by `params`.
    pub fn sample(image: &QuantizedImage, params: &MeshParams) -> HeightmapResult<Self> {
        params.validate()?;

        let grid_width = (f64::from(image.width()) * params.resolution).floor() as usize;
        let grid_height = (f64::from(image.height()) * params.resolution).floor() as usize;
        let skip = params.skip();
        let columns = grid_width.div_ceil(skip);
        let rows = grid_height.div_ceil(skip);

        if columns < 2 || rows < 2 {
            return Err(HeightmapError::GridTooSmall {
                grid_width,
                grid_height,
                columns,
                rows,
            });
        }

        let source_x: Vec<u32> = (0..columns)
            .map(|c| source_coord(c * skip, params.resolution, image.width()))
            .collect();

        let mut heights = Vec::with_capacity(columns * rows);
        let mut unmatched = 0;
        for r in 0..rows {
            let sy = source_coord(r * skip, params.resolution, image.height());
            for &sx in &source_x {
                let rank = image.rank_at(sx, sy);
                if rank.is_none() {
                    unmatched += 1;
                }
                heights.push(params.height_for(rank));
            }
        }

        if unmatched > 0 {
            warn!(
                "{} of {} samples have no palette rank; placed at base height",
                unmatched,
                heights.len()
            );
        }

        let grid = Self {
            grid_width,
            grid_height,
            columns,
            rows,
            skip,
            scale_x: params.object_width_mm / (grid_width - 1) as f64,
            scale_y: params.object_height_mm / (grid_height - 1) as f64,
            unmatched,
            heights,
        };
        debug!(
            "Sampled {}x{} vertices from {}x{} grid (skip {})",
            grid.columns, grid.rows, grid.grid_width, grid.grid_height, grid.skip
        );
        Ok(grid)
    }

    /// Number of sampled vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Top surface height at sampled column `c`, row `r`.
    #[inline]
    pub fn height(&self, c: usize, r: usize) -> f64 {
        self.heights[r * self.columns + c]
    }

    /// Top surface point at sampled column `c`, row `r`.
    #[inline]
    pub fn top_point(&self, c: usize, r: usize) -> Point3<f64> {
        let mut p = self.base_point(c, r);
        p.z = self.height(c, r);
        p
    }

    /// Point on the `z = 0` plane under sampled column `c`, row `r`.
    #[inline]
    pub fn base_point(&self, c: usize, r: usize) -> Point3<f64> {
        Point3::new(
            (c * self.skip) as f64 * self.scale_x,
            (r * self.skip) as f64 * self.scale_y,
            0.0,
        )
    }
}

#[inline]
fn source_coord(grid_coord: usize, resolution: f64, extent: u32) -> u32 {
    let s = (grid_coord as f64 / resolution).floor() as u32;
    s.min(extent - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relief_color::{Palette, PixelBuffer, Rgb};

    fn striped(width: u32, height: u32) -> QuantizedImage {
        // Column x gets palette rank x % 3.
        let palette = vec![Rgb::new(0, 0, 0), Rgb::new(100, 0, 0), Rgb::new(200, 0, 0)];
        let colors: Vec<Rgb> = (0..height)
            .flat_map(|_| (0..width).map(|x| palette[(x % 3) as usize]).collect::<Vec<_>>())
            .collect();
        let pixels = PixelBuffer::from_colors(width, height, colors).unwrap();
        QuantizedImage::from_pixels(pixels, Palette::new(palette).unwrap())
    }

    #[test]
    fn test_full_resolution_samples_every_pixel() {
        let image = striped(6, 4);
        let grid = SampleGrid::sample(&image, &MeshParams::default()).unwrap();

        assert_eq!((grid.columns, grid.rows), (6, 4));
        assert_eq!(grid.len(), 24);
        assert_eq!(grid.height(0, 0), 5.0);
        assert_eq!(grid.height(1, 2), 6.0);
        assert_eq!(grid.height(5, 3), 7.0);
        assert!((grid.scale_x - 14.0).abs() < 1e-12);
        let corner = grid.top_point(5, 3);
        assert!((corner - Point3::new(70.0, 40.0, 7.0)).norm() < 1e-9);
    }

    #[test]
    fn test_stride_keeps_vertex_and_source_indexing_aligned() {
        let image = striped(9, 5);
        let params = MeshParams {
            simplification_level: 1,
            ..MeshParams::default()
        };
        let grid = SampleGrid::sample(&image, &params).unwrap();

        // Columns 0, 2, 4, 6, 8 and rows 0, 2, 4.
        assert_eq!((grid.columns, grid.rows), (5, 3));
        let expected: Vec<f64> = [0, 2, 4, 6, 8].iter().map(|x| 5.0 + (x % 3) as f64).collect();
        let actual: Vec<f64> = (0..5).map(|c| grid.height(c, 1)).collect();
        assert_eq!(actual, expected);
        assert_eq!(grid.base_point(4, 2).x, 8.0 * grid.scale_x);
    }

    #[test]
    fn test_resolution_reads_scaled_source() {
        let image = striped(8, 8);
        let params = MeshParams {
            resolution: 0.5,
            ..MeshParams::default()
        };
        let grid = SampleGrid::sample(&image, &params).unwrap();

        assert_eq!((grid.grid_width, grid.grid_height), (4, 4));
        // Grid column c reads source column 2c.
        let actual: Vec<f64> = (0..4).map(|c| grid.height(c, 0)).collect();
        assert_eq!(actual, vec![5.0, 7.0, 6.0, 5.0]);
    }

    #[test]
    fn test_unmatched_pixels_fall_back_to_base() {
        let pixels = PixelBuffer::from_colors(2, 2, [Rgb::BLACK, Rgb::WHITE, Rgb::WHITE, Rgb::BLACK]).unwrap();
        let image = QuantizedImage::from_pixels(pixels, Palette::new(vec![Rgb::WHITE]).unwrap());
        let params = MeshParams {
            base_height_mm: 2.0,
            ..MeshParams::default()
        };
        let grid = SampleGrid::sample(&image, &params).unwrap();

        assert_eq!(grid.unmatched, 2);
        assert_eq!(grid.height(0, 0), 2.0);
        assert_eq!(grid.height(1, 0), 2.0);
    }

    #[test]
    fn test_single_column_is_too_small() {
        let image = striped(1, 5);
        assert!(matches!(
            SampleGrid::sample(&image, &MeshParams::default()),
            Err(HeightmapError::GridTooSmall { columns: 1, .. })
        ));

        let image = striped(3, 3);
        let params = MeshParams {
            simplification_level: 2,
            ..MeshParams::default()
        };
        assert!(SampleGrid::sample(&image, &params).is_err());
    }
}
