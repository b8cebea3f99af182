//! Substituting discovered centroids with a caller-chosen palette.
//!
//! Both color lists are sorted by luminance and matched rank to rank, so the
//! darkest centroid becomes the darkest target color and so on. When the
//! lists differ in length, centroid rank `i` of `n` maps to target rank
//! `floor(i * (m - 1) / (n - 1))` of `m`.

use hashbrown::HashMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::color::Rgb;
use crate::error::ColorResult;
use crate::palette::{Palette, QuantizedImage};
use crate::pixels::PixelBuffer;

/// One centroid-to-target substitution, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorMapping {
    pub from: Rgb,
    pub to: Rgb,
}

/// Output of [`remap`].
#[derive(Debug, Clone)]
pub struct Remapping {
    /// Image whose colors come from the target palette, or the input when
    /// remapping was skipped.
    pub image: QuantizedImage,
    /// Substitutions in ascending centroid luminance.
    pub mapping: Vec<ColorMapping>,
    /// False when the target was empty and the input passed through.
    pub applied: bool,
}

/// Target rank for centroid rank `i` out of `n` against `m` targets.
#[inline]
pub fn target_rank(i: usize, n: usize, m: usize) -> usize {
    if n <= 1 || m == 0 {
        0
    } else {
        i * (m - 1) / (n - 1)
    }
}

/// Stable ascending sort by luminance.
pub fn sort_by_luminance(colors: &mut [Rgb]) {
    colors.sort_by(|a, b| a.luminance().total_cmp(&b.luminance()));
}

/// Replace the palette of `image` with `target`, preserving brightness order.
///
/// The returned palette is `target` sorted by luminance. An empty target
/// leaves the image untouched and logs a warning.
pub fn remap(image: QuantizedImage, target: &[Rgb]) -> ColorResult<Remapping> {
    if target.is_empty() || image.palette().is_empty() {
        warn!("Target palette is empty; keeping quantized colors");
        return Ok(Remapping {
            image,
            mapping: Vec::new(),
            applied: false,
        });
    }

    let mut sorted_target = target.to_vec();
    sort_by_luminance(&mut sorted_target);
    let final_palette = Palette::new(sorted_target)?;

    let mut sorted_centroids = image.palette().colors().to_vec();
    sort_by_luminance(&mut sorted_centroids);

    let n = sorted_centroids.len();
    let m = final_palette.len();
    info!("Remapping {} centroids onto {} palette colors", n, m);

    // Keyed by color; a duplicated centroid keeps its last assignment.
    let mut table: HashMap<Rgb, u8> = HashMap::with_capacity(n);
    let mut mapping = Vec::with_capacity(n);
    for (i, &from) in sorted_centroids.iter().enumerate() {
        let t = target_rank(i, n, m);
        let to = final_palette.colors()[t];
        let rank = final_palette.index_of(to).unwrap_or(t) as u8;
        table.insert(from, rank);
        mapping.push(ColorMapping { from, to });
        debug!("{} -> {}", from, to);
    }

    let (pixels, old_palette, old_indices) = image.into_parts();
    let new_indices: Vec<Option<u8>> = old_indices
        .iter()
        .map(|idx| {
            idx.and_then(|i| old_palette.get(i as usize))
                .and_then(|c| table.get(&c).copied())
        })
        .collect();

    let colors = pixels
        .colors()
        .zip(&new_indices)
        .map(|(c, idx)| match idx {
            Some(rank) => final_palette.colors()[*rank as usize],
            None => c,
        });
    let pixels = PixelBuffer::from_colors(pixels.width(), pixels.height(), colors)?;

    Ok(Remapping {
        image: QuantizedImage::from_parts(pixels, final_palette, new_indices)?,
        mapping,
        applied: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(v: u8) -> Rgb {
        Rgb::new(v, v, v)
    }

    /// One pixel per palette entry, in palette order.
    fn image_of(palette: &[Rgb]) -> QuantizedImage {
        let pixels = PixelBuffer::from_colors(palette.len() as u32, 1, palette.iter().copied()).unwrap();
        QuantizedImage::from_pixels(pixels, Palette::new(palette.to_vec()).unwrap())
    }

    #[test]
    fn test_rank_formula() {
        assert_eq!(
            (0..4).map(|i| target_rank(i, 4, 2)).collect::<Vec<_>>(),
            vec![0, 0, 0, 1]
        );
        assert_eq!(
            (0..2).map(|i| target_rank(i, 2, 4)).collect::<Vec<_>>(),
            vec![0, 3]
        );
        assert_eq!(target_rank(0, 1, 5), 0);
    }

    #[test]
    fn test_four_centroids_onto_two_targets() {
        // Unsorted on purpose: ranks follow luminance, not input order.
        let centroids = [gray(200), gray(10), gray(150), gray(60)];
        let target = [Rgb::WHITE, Rgb::BLACK];
        let out = remap(image_of(&centroids), &target).unwrap();

        assert!(out.applied);
        assert_eq!(out.image.palette().colors(), &[Rgb::BLACK, Rgb::WHITE]);

        let ranks: Vec<_> = out.mapping.iter().map(|m| out.image.palette().index_of(m.to).unwrap()).collect();
        assert_eq!(ranks, vec![0, 0, 0, 1]);
        assert_eq!(out.mapping[0].from, gray(10));
        assert_eq!(out.mapping[3].from, gray(200));

        assert_eq!(out.image.indices(), &[Some(1), Some(0), Some(0), Some(0)]);
    }

    #[test]
    fn test_every_pixel_lands_in_final_palette() {
        let centroids = [Rgb::new(30, 90, 10), Rgb::new(240, 20, 20), Rgb::new(5, 5, 80)];
        let target = [
            Rgb::from_hex("#000000").unwrap(),
            Rgb::from_hex("#FF0000").unwrap(),
            Rgb::from_hex("#FF00FF").unwrap(),
            Rgb::from_hex("#FFA500").unwrap(),
        ];
        let out = remap(image_of(&centroids), &target).unwrap();

        for (color, idx) in out.image.pixels().colors().zip(out.image.indices()) {
            assert!(out.image.palette().colors().contains(&color));
            assert_eq!(out.image.palette().get(idx.unwrap() as usize), Some(color));
        }
    }

    #[test]
    fn test_empty_target_passes_through() {
        let centroids = [gray(20), gray(220)];
        let input = image_of(&centroids);
        let out = remap(input.clone(), &[]).unwrap();

        assert!(!out.applied);
        assert!(out.mapping.is_empty());
        assert_eq!(out.image, input);
    }

    #[test]
    fn test_duplicate_targets_share_first_rank() {
        let centroids = [gray(0), gray(255)];
        let target = [gray(100), gray(100)];
        let out = remap(image_of(&centroids), &target).unwrap();
        assert_eq!(out.image.indices(), &[Some(0), Some(0)]);
    }
}
