//! Raster image recompression and WebP conversion.

use anyhow::{anyhow, Context as _, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, DynamicImage, ImageEncoder};

/// Re-encode a JPEG at `quality` (1-100).
pub fn recompress_jpeg(bytes: &[u8], quality: u8) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes).context("Failed to decode JPEG")?;
    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
        .context("Failed to encode JPEG")?;
    Ok(out)
}

/// Re-encode a PNG at the highest deflate level with adaptive filtering.
pub fn recompress_png(bytes: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes).context("Failed to decode PNG")?;
    let mut out = Vec::new();
    PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive)
        .write_image(img.as_bytes(), img.width(), img.height(), img.color())
        .context("Failed to encode PNG")?;
    Ok(out)
}

/// Convert a JPEG or PNG to lossy WebP at `quality` (0-100).
pub fn to_webp(bytes: &[u8], quality: f32) -> Result<Vec<u8>> {
    let img = image::load_from_memory(bytes).context("Failed to decode image")?;
    let img = if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };
    let encoder = webp::Encoder::from_image(&img).map_err(|e| anyhow!("Failed to encode WebP: {}", e))?;
    Ok(encoder.encode(quality).to_vec())
}

/// `candidate` if it is strictly smaller than `original`.
pub fn keep_if_smaller(original: &[u8], candidate: Vec<u8>) -> Option<Vec<u8>> {
    (candidate.len() < original.len()).then_some(candidate)
}
