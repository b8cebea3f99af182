//! Reading photos and writing quantized previews.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use tracing::{debug, info};

use relief_color::PixelBuffer;

/// Longest side a photo is reduced to before quantization.
pub const MAX_SIDE: u32 = 800;

/// Shrink `img` so its longer side is at most `max_side`, keeping aspect.
pub fn downscale(img: DynamicImage, max_side: u32) -> DynamicImage {
    if img.width().max(img.height()) <= max_side {
        return img;
    }
    let resized = img.resize(max_side, max_side, FilterType::Triangle);
    debug!(
        "Resized {}x{} to {}x{}",
        img.width(),
        img.height(),
        resized.width(),
        resized.height()
    );
    resized
}

/// Load a photo as an RGBA pixel buffer, downscaled to [`MAX_SIDE`].
pub fn load_photo(path: &Path) -> Result<PixelBuffer> {
    let img = image::open(path).with_context(|| format!("failed to read image {}", path.display()))?;
    let rgba = downscale(img, MAX_SIDE).into_rgba8();
    let (width, height) = rgba.dimensions();
    info!("Loaded {} ({}x{})", path.display(), width, height);

    PixelBuffer::new(width, height, rgba.into_raw()).context("image has no pixels")
}

/// Write a pixel buffer as an image; the format follows the extension.
pub fn save_pixels(pixels: &PixelBuffer, path: &Path) -> Result<()> {
    let img = RgbaImage::from_raw(pixels.width(), pixels.height(), pixels.as_bytes().to_vec())
        .ok_or_else(|| anyhow!("pixel buffer does not match its dimensions"))?;
    let img = DynamicImage::ImageRgba8(img);

    // JPEG has no alpha channel.
    let is_jpeg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));
    let img = if is_jpeg {
        DynamicImage::ImageRgb8(img.into_rgb8())
    } else {
        img
    };

    img.save(path)
        .with_context(|| format!("failed to write image {}", path.display()))
}
