//! In-memory camera used by tests.

use image::{Rgb, RgbImage, RgbaImage};
use std::path::{Path, PathBuf};

use super::{Camera, CameraError};

/// Records calls and writes a solid-color still on each capture
#[derive(Debug)]
pub struct FakeCamera {
    pub width: u32,
    pub height: u32,
    pub previewing: bool,
    pub overlay: Option<(RgbaImage, u8)>,
    pub captures: Vec<PathBuf>,
    pub fail_capture: bool,
    pub revision: u64,
}

impl FakeCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            previewing: false,
            overlay: None,
            captures: Vec::new(),
            fail_capture: false,
            revision: 0,
        }
    }

    /// Scene color for the n-th capture, so consecutive stills differ
    pub fn scene_color(n: usize) -> Rgb<u8> {
        let step = (n as u8).wrapping_mul(40);
        Rgb([step, 255 - step, 90])
    }
}

impl Camera for FakeCamera {
    fn start_preview(&mut self) -> Result<(), CameraError> {
        self.previewing = true;
        self.revision += 1;
        Ok(())
    }

    fn stop_preview(&mut self) -> Result<(), CameraError> {
        self.previewing = false;
        Ok(())
    }

    fn is_previewing(&self) -> bool {
        self.previewing
    }

    fn add_overlay(&mut self, overlay: RgbaImage, alpha: u8) {
        self.overlay = Some((overlay, alpha));
        self.revision += 1;
    }

    fn remove_overlays(&mut self) {
        self.overlay = None;
        self.revision += 1;
    }

    fn capture(&mut self, path: &Path) -> Result<(), CameraError> {
        if self.fail_capture {
            return Err(CameraError::MissingOutput(path.to_path_buf()));
        }
        let color = Self::scene_color(self.captures.len());
        RgbImage::from_pixel(self.width, self.height, color)
            .save(path)
            .map_err(|e| CameraError::Io(std::io::Error::other(e)))?;
        self.captures.push(path.to_path_buf());
        Ok(())
    }

    fn preview_frame(&self) -> Option<RgbaImage> {
        self.previewing
            .then(|| RgbaImage::new(self.width, self.height))
    }

    fn preview_revision(&self) -> u64 {
        self.revision
    }
}
