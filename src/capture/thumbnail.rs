//! On-screen thumbnail generation

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::path::Path;
use tracing::debug;

/// Bounding box for the on-screen thumbnail
pub const THUMBNAIL_SIZE: (u32, u32) = (400, 400);

/// Largest size fitting in `max` with the aspect ratio of `size`. Never upscales.
pub fn fit_within(size: (u32, u32), max: (u32, u32)) -> (u32, u32) {
    let (w, h) = size;
    let (max_w, max_h) = max;
    if w <= max_w && h <= max_h {
        return size;
    }

    let scale = (max_w as f64 / w as f64).min(max_h as f64 / h as f64);
    let fit = |v: u32, limit: u32| ((v as f64 * scale).round() as u32).clamp(1, limit);
    (fit(w, max_w), fit(h, max_h))
}

/// Downscale the image at `src` and write it to `dst` as a GIF
pub fn write_thumbnail(src: &Path, dst: &Path, max: (u32, u32)) -> Result<(u32, u32)> {
    let source = image::open(src).with_context(|| format!("Failed to open capture {:?}", src))?;
    let (width, height) = fit_within((source.width(), source.height()), max);

    let thumb = if (width, height) == (source.width(), source.height()) {
        source
    } else {
        source.resize_exact(width, height, FilterType::Lanczos3)
    };

    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent)?;
    }
    DynamicImage::ImageRgba8(thumb.to_rgba8())
        .save_with_format(dst, ImageFormat::Gif)
        .with_context(|| format!("Failed to write thumbnail {:?}", dst))?;

    debug!("Thumbnail {}x{} written to {:?}", width, height, dst);
    Ok((width, height))
}
