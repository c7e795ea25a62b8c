//! Overlay compositing
//!
//! `preview_layer` prepares an overlay for drawing over live preview frames
//! at reduced opacity. `burn_in` composites it at full opacity into a saved
//! capture.

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use std::path::Path;

use super::{Overlay, OverlayError};

/// Stretch `overlay` to `width`x`height` if needed
fn fitted(overlay: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if overlay.dimensions() == (width, height) {
        overlay.clone()
    } else {
        imageops::resize(overlay, width, height, FilterType::Lanczos3)
    }
}

/// `overlay` fitted to `width`x`height` with its alpha scaled by
/// `alpha / 255`, ready to composite over every preview frame
pub fn preview_layer(overlay: &RgbaImage, width: u32, height: u32, alpha: u8) -> RgbaImage {
    let mut layer = fitted(overlay, width, height);
    if alpha < u8::MAX {
        for pixel in layer.pixels_mut() {
            pixel[3] = ((pixel[3] as u16 * alpha as u16) / 255) as u8;
        }
    }
    layer
}

/// Permanently composite `overlay` into the image file at `path`
pub fn burn_in(path: &Path, overlay: &Overlay) -> Result<(), OverlayError> {
    let mut canvas = image::open(path)?.to_rgba8();
    let layer = fitted(&overlay.image, canvas.width(), canvas.height());
    imageops::overlay(&mut canvas, &layer, 0, 0);

    // Captures carry no alpha; keep the output encodable as JPEG too.
    DynamicImage::ImageRgba8(canvas).to_rgb8().save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba};

    #[test]
    fn test_preview_layer_scales_alpha() {
        let overlay = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        let layer = preview_layer(&overlay, 2, 2, 128);
        assert_eq!(layer.get_pixel(0, 0), &Rgba([255, 255, 255, 128]));

        let mut frame = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        imageops::overlay(&mut frame, &layer, 0, 0);
        let px = frame.get_pixel(0, 0);
        assert!(px[0] > 100 && px[0] < 160, "half blend, got {}", px[0]);
    }

    #[test]
    fn test_preview_layer_fits_frame_size() {
        let overlay = RgbaImage::from_pixel(4, 3, Rgba([255, 0, 0, 255]));
        let layer = preview_layer(&overlay, 80, 60, 255);
        assert_eq!(layer.dimensions(), (80, 60));
    }

    #[test]
    fn test_transparent_layer_leaves_frame() {
        let mut frame = RgbaImage::from_pixel(3, 3, Rgba([10, 20, 30, 255]));
        let overlay = RgbaImage::from_pixel(3, 3, Rgba([255, 0, 0, 0]));

        imageops::overlay(&mut frame, &preview_layer(&overlay, 3, 3, 255), 0, 0);
        assert_eq!(frame.get_pixel(1, 1), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_burn_in_scales_overlay_to_capture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.png");
        RgbImage::from_pixel(8, 6, Rgb([0, 0, 255])).save(&path).unwrap();

        let overlay = Overlay {
            name: "red".into(),
            image: RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255])),
        };
        burn_in(&path, &overlay).unwrap();

        let result = image::open(&path).unwrap().to_rgb8();
        assert_eq!(result.dimensions(), (8, 6));
        let corner = result.get_pixel(7, 5);
        assert!(corner[0] > 240 && corner[2] < 15, "overlay not burned in: {:?}", corner);
    }

    #[test]
    fn test_burn_in_missing_file_fails() {
        let overlay = Overlay {
            name: "x".into(),
            image: RgbaImage::new(1, 1),
        };
        assert!(burn_in(Path::new("/nonexistent/capture.png"), &overlay).is_err());
    }
}
