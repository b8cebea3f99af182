//! Ordered palettes and palette-indexed images.
//!
//! Palette order is significant: the rank of a color is the number of print
//! layers stacked on top of the base wherever that color appears.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::color::Rgb;
use crate::error::{ColorError, ColorResult};
use crate::pixels::PixelBuffer;

/// Largest palette a per-pixel `u8` index can address.
pub const MAX_PALETTE_LEN: usize = 256;

/// A color together with its rank in a [`Palette`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    pub rank: usize,
    pub color: Rgb,
}

/// An ordered list of colors; duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    pub fn new(colors: Vec<Rgb>) -> ColorResult<Self> {
        if colors.len() > MAX_PALETTE_LEN {
            return Err(ColorError::PaletteTooLarge {
                len: colors.len(),
                max: MAX_PALETTE_LEN,
            });
        }
        Ok(Self { colors })
    }

    /// Parse `#RRGGBB` strings, failing on the first invalid entry.
    pub fn from_hex<S: AsRef<str>>(values: &[S]) -> ColorResult<Self> {
        let colors = values
            .iter()
            .map(|v| Rgb::from_hex(v.as_ref()))
            .collect::<ColorResult<Vec<_>>>()?;
        Self::new(colors)
    }

    /// Parse `#RRGGBB` strings, dropping invalid entries with a warning.
    pub fn from_hex_lenient<S: AsRef<str>>(values: &[S]) -> Vec<Rgb> {
        values
            .iter()
            .filter_map(|v| match Rgb::from_hex(v.as_ref()) {
                Ok(c) => Some(c),
                Err(e) => {
                    warn!("Ignoring palette entry: {}", e);
                    None
                }
            })
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[inline]
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn get(&self, rank: usize) -> Option<Rgb> {
        self.colors.get(rank).copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = PaletteEntry> + '_ {
        self.colors
            .iter()
            .enumerate()
            .map(|(rank, &color)| PaletteEntry { rank, color })
    }

    /// Rank of the first entry equal to `color`.
    pub fn index_of(&self, color: Rgb) -> Option<usize> {
        self.colors.iter().position(|&c| c == color)
    }

    /// Lookup table from color to the rank of its first occurrence.
    pub fn lookup(&self) -> HashMap<Rgb, u8> {
        let mut table = HashMap::with_capacity(self.colors.len());
        for entry in self.entries() {
            table.entry(entry.color).or_insert(entry.rank as u8);
        }
        table
    }

    pub fn to_hex(&self) -> Vec<String> {
        self.colors.iter().map(|c| c.to_hex()).collect()
    }
}

/// An image whose pixels are drawn from a palette, plus the palette rank of
/// every pixel.
///
/// The per-pixel rank is computed once, when the image is produced, so later
/// stages never compare colors again.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedImage {
    pixels: PixelBuffer,
    palette: Palette,
    indices: Vec<Option<u8>>,
}

impl QuantizedImage {
    /// Assemble from precomputed ranks.
    pub fn from_parts(pixels: PixelBuffer, palette: Palette, indices: Vec<Option<u8>>) -> ColorResult<Self> {
        if indices.len() != pixels.pixel_count() {
            return Err(ColorError::IndexLength {
                expected: pixels.pixel_count(),
                actual: indices.len(),
            });
        }
        Ok(Self {
            pixels,
            palette,
            indices,
        })
    }

    /// Rebuild the per-pixel ranks by exact color lookup.
    ///
    /// Used when pixels and palette arrive separately, e.g. as hex strings
    /// from an outside caller. Pixels whose color is not in the palette get no
    /// rank and are counted by [`QuantizedImage::unmatched_count`].
    pub fn from_pixels(pixels: PixelBuffer, palette: Palette) -> Self {
        let table = palette.lookup();
        let indices: Vec<Option<u8>> = pixels.colors().map(|c| table.get(&c).copied()).collect();

        let image = Self {
            pixels,
            palette,
            indices,
        };
        let unmatched = image.unmatched_count();
        if unmatched > 0 {
            warn!(
                "{} of {} pixels match no palette color and will sit at base height",
                unmatched,
                image.pixels.pixel_count()
            );
        }
        image
    }

    #[inline]
    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    #[inline]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[inline]
    pub fn indices(&self) -> &[Option<u8>] {
        &self.indices
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Palette rank at column `x`, row `y`.
    #[inline]
    pub fn rank_at(&self, x: u32, y: u32) -> Option<u8> {
        self.indices[y as usize * self.pixels.width() as usize + x as usize]
    }

    pub fn unmatched_count(&self) -> usize {
        self.indices.iter().filter(|i| i.is_none()).count()
    }

    pub fn into_parts(self) -> (PixelBuffer, Palette, Vec<Option<u8>>) {
        (self.pixels, self.palette, self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_of_returns_first_duplicate() {
        let palette = Palette::new(vec![Rgb::BLACK, Rgb::WHITE, Rgb::BLACK]).unwrap();
        assert_eq!(palette.index_of(Rgb::BLACK), Some(0));
        assert_eq!(palette.lookup()[&Rgb::BLACK], 0);
        assert_eq!(palette.index_of(Rgb::new(1, 2, 3)), None);
    }

    #[test]
    fn test_lenient_parse_drops_invalid_entries() {
        let colors = Palette::from_hex_lenient(&["#000000", "nope", "FF0000"]);
        assert_eq!(colors, vec![Rgb::BLACK, Rgb::new(255, 0, 0)]);
    }

    #[test]
    fn test_strict_parse_fails_on_invalid_entry() {
        assert!(Palette::from_hex(&["#000000", "#zzzzzz"]).is_err());
    }

    #[test]
    fn test_from_pixels_ranks_every_pixel() {
        let red = Rgb::new(255, 0, 0);
        let pixels = PixelBuffer::from_colors(2, 2, [Rgb::BLACK, red, red, Rgb::new(9, 9, 9)]).unwrap();
        let palette = Palette::new(vec![Rgb::BLACK, red]).unwrap();

        let image = QuantizedImage::from_pixels(pixels, palette);
        assert_eq!(image.indices(), &[Some(0), Some(1), Some(1), None]);
        assert_eq!(image.rank_at(1, 0), Some(1));
        assert_eq!(image.unmatched_count(), 1);
    }

    #[test]
    fn test_from_parts_checks_length() {
        let pixels = PixelBuffer::filled(2, 1, Rgb::BLACK).unwrap();
        let palette = Palette::new(vec![Rgb::BLACK]).unwrap();
        assert!(QuantizedImage::from_parts(pixels, palette, vec![Some(0)]).is_err());
    }

    #[test]
    fn test_palette_too_large_is_rejected() {
        assert!(Palette::new(vec![Rgb::BLACK; MAX_PALETTE_LEN + 1]).is_err());
    }
}
