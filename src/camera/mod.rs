//! Camera Layer
//!
//! The booth talks to the camera through the [`Camera`] trait: live preview
//! on/off, an alpha-blended overlay layer on the preview, and full resolution
//! stills written straight to disk. [`RpicamCamera`] drives the Raspberry Pi
//! camera stack through its command line tools.

pub mod mjpeg;
pub mod rpicam;

#[cfg(test)]
pub mod fake;

use image::RgbaImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use rpicam::RpicamCamera;

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("failed to launch `{0}`: {1}")]
    Spawn(String, #[source] std::io::Error),
    #[error("`{command}` exited with {status}")]
    CommandFailed { command: String, status: std::process::ExitStatus },
    #[error("capture did not produce {0:?}")]
    MissingOutput(PathBuf),
    #[error("preview stream closed")]
    PreviewClosed,
    #[error("camera I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Camera configuration applied at open time
#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub width: u32,
    pub height: u32,
    /// Mirror horizontally
    pub hflip: bool,
    pub preview_command: String,
    pub still_command: String,
}

impl From<&crate::config::CameraSettings> for CameraSettings {
    fn from(config: &crate::config::CameraSettings) -> Self {
        Self {
            width: config.width,
            height: config.height,
            hflip: config.hflip,
            preview_command: config.preview_command.clone(),
            still_command: config.still_command.clone(),
        }
    }
}

/// A camera with a live preview and still capture.
///
/// Backends that cannot share the sensor between preview and stills may
/// pause the preview inside [`Camera::capture`]; callers stop the preview
/// afterwards regardless.
pub trait Camera {
    /// Start the live preview. Starting twice is a no-op.
    fn start_preview(&mut self) -> Result<(), CameraError>;

    /// Stop the live preview. Stopping a stopped camera is a no-op.
    fn stop_preview(&mut self) -> Result<(), CameraError>;

    fn is_previewing(&self) -> bool;

    /// Show `overlay` over the preview, replacing any previous overlay
    fn add_overlay(&mut self, overlay: RgbaImage, alpha: u8);

    /// Drop every preview overlay layer
    fn remove_overlays(&mut self);

    /// Write one full resolution still to `path`
    fn capture(&mut self, path: &Path) -> Result<(), CameraError>;

    /// Latest preview frame with the overlay applied, if previewing
    fn preview_frame(&self) -> Option<RgbaImage>;

    /// Changes whenever the preview picture does: a new frame arrived or
    /// the overlay changed. Never decreases.
    fn preview_revision(&self) -> u64;
}
