//! Raw RGBA pixel storage.

use crate::color::Rgb;
use crate::error::{ColorError, ColorResult};

/// Number of bytes per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// A row-major RGBA8 image.
///
/// Always holds exactly `width * height * 4` bytes and at least one pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA bytes, checking the length invariant.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> ColorResult<Self> {
        if width == 0 || height == 0 {
            return Err(ColorError::EmptyImage { width, height });
        }
        let expected = width as usize * height as usize * CHANNELS;
        if data.len() != expected {
            return Err(ColorError::BufferLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build an opaque image from one color per pixel.
    pub fn from_colors(width: u32, height: u32, colors: impl IntoIterator<Item = Rgb>) -> ColorResult<Self> {
        let mut data = Vec::with_capacity(width as usize * height as usize * CHANNELS);
        for c in colors {
            data.extend_from_slice(&[c.r, c.g, c.b, 255]);
        }
        Self::new(width, height, data)
    }

    /// A uniformly colored opaque image.
    pub fn filled(width: u32, height: u32, color: Rgb) -> ColorResult<Self> {
        let count = width as usize * height as usize;
        Self::from_colors(width, height, std::iter::repeat(color).take(count))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Color of the pixel at flat index `i`, alpha ignored.
    #[inline]
    pub fn color(&self, i: usize) -> Rgb {
        let o = i * CHANNELS;
        Rgb::new(self.data[o], self.data[o + 1], self.data[o + 2])
    }

    /// Color at column `x`, row `y`.
    #[inline]
    pub fn color_at(&self, x: u32, y: u32) -> Rgb {
        self.color(y as usize * self.width as usize + x as usize)
    }

    /// Iterate pixel colors in row-major order.
    pub fn colors(&self) -> impl Iterator<Item = Rgb> + '_ {
        self.data
            .chunks_exact(CHANNELS)
            .map(|p| Rgb::new(p[0], p[1], p[2]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_wrong_length() {
        let err = PixelBuffer::new(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            ColorError::BufferLength {
                expected: 16,
                actual: 15
            }
        ));
    }

    #[test]
    fn test_rejects_empty_dimensions() {
        assert!(matches!(
            PixelBuffer::new(0, 3, vec![]),
            Err(ColorError::EmptyImage { .. })
        ));
    }

    #[test]
    fn test_color_at_is_row_major() {
        let colors = [
            Rgb::new(1, 0, 0),
            Rgb::new(2, 0, 0),
            Rgb::new(3, 0, 0),
            Rgb::new(4, 0, 0),
            Rgb::new(5, 0, 0),
            Rgb::new(6, 0, 0),
        ];
        let img = PixelBuffer::from_colors(3, 2, colors).unwrap();
        assert_eq!(img.color_at(0, 1), Rgb::new(4, 0, 0));
        assert_eq!(img.color_at(2, 0), Rgb::new(3, 0, 0));
        assert_eq!(img.colors().count(), 6);
        assert_eq!(img.as_bytes()[3], 255);
    }
}
