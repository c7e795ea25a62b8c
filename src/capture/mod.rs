//! Capture Controller
//!
//! Owns the camera and the overlay cursor. A capture is a fixed pipeline:
//! still to disk, stop preview, drop preview overlays, burn the overlay into
//! the file, write the thumbnail. A failing step aborts the rest and nothing
//! is rolled back.

pub mod thumbnail;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::camera::Camera;
use crate::config::AppConfig;
use crate::overlay::{self, OverlayLibrary};
use crate::storage::capture_path;

pub use thumbnail::{write_thumbnail, THUMBNAIL_SIZE};

/// Capture output configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Directory receiving captures
    pub images_dir: PathBuf,
    /// Capture file extension
    pub extension: String,
    /// Add seconds to capture names
    pub unique_names: bool,
    /// Fixed thumbnail path
    pub thumbnail_path: PathBuf,
    /// Overlay opacity on the live preview
    pub preview_alpha: u8,
}

impl From<&AppConfig> for CaptureConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            images_dir: config.storage.images_dir.clone(),
            extension: config.storage.extension.clone(),
            unique_names: config.storage.unique_names,
            thumbnail_path: config.storage.thumbnail_path.clone(),
            preview_alpha: config.camera.preview_alpha,
        }
    }
}

/// Camera state plus the capture pipeline
pub struct CaptureController {
    camera: Box<dyn Camera>,
    overlays: OverlayLibrary,
    config: CaptureConfig,
    current_output: Option<PathBuf>,
    thumbnail_generation: u64,
}

impl CaptureController {
    pub fn new(camera: Box<dyn Camera>, overlays: OverlayLibrary, config: CaptureConfig) -> Self {
        Self {
            camera,
            overlays,
            config,
            current_output: None,
            thumbnail_generation: 0,
        }
    }

    /// Turn on the live preview with the current overlay over it
    pub fn start_preview(&mut self) -> Result<()> {
        self.camera.start_preview().context("Failed to start preview")?;
        self.render_preview_overlay();
        Ok(())
    }

    /// Select the next overlay and show it on the preview
    pub fn advance_overlay(&mut self) -> usize {
        match self.overlays.advance() {
            Some(selected) => info!("Overlay '{}' selected", selected.name),
            None => warn!("No overlays loaded, nothing to advance"),
        }
        if self.camera.is_previewing() {
            self.render_preview_overlay();
        }
        self.overlays.current_index()
    }

    fn render_preview_overlay(&mut self) {
        self.camera.remove_overlays();
        if let Some(current) = self.overlays.current() {
            self.camera
                .add_overlay(current.image.clone(), self.config.preview_alpha);
        }
    }

    /// Run the capture pipeline for a photo taken at `at`
    pub fn take_photo(&mut self, at: DateTime<Utc>) -> Result<PathBuf> {
        let output = capture_path(
            &self.config.images_dir,
            &self.config.extension,
            self.config.unique_names,
            at,
        );
        std::fs::create_dir_all(&self.config.images_dir).with_context(|| {
            format!("Failed to create image directory {:?}", self.config.images_dir)
        })?;

        self.camera
            .capture(&output)
            .with_context(|| format!("Failed to capture {:?}", output))?;
        self.current_output = Some(output.clone());

        self.camera.stop_preview().context("Failed to stop preview")?;
        self.camera.remove_overlays();

        if let Some(current) = self.overlays.current() {
            overlay::burn_in(&output, current)
                .with_context(|| format!("Failed to apply overlay '{}'", current.name))?;
        }

        write_thumbnail(&output, &self.config.thumbnail_path, THUMBNAIL_SIZE)?;
        self.thumbnail_generation += 1;

        info!("Captured {:?}", output);
        Ok(output)
    }

    pub fn is_previewing(&self) -> bool {
        self.camera.is_previewing()
    }

    /// Most recent capture, if any
    pub fn current_output(&self) -> Option<&Path> {
        self.current_output.as_deref()
    }

    /// Bumped every time the thumbnail file is rewritten
    pub fn thumbnail_generation(&self) -> u64 {
        self.thumbnail_generation
    }

    pub fn thumbnail_path(&self) -> &Path {
        &self.config.thumbnail_path
    }

    pub fn overlay_index(&self) -> usize {
        self.overlays.current_index()
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    /// Latest live frame for on-screen preview
    pub fn preview_frame(&self) -> Option<image::RgbaImage> {
        self.camera.preview_frame()
    }

    pub fn preview_revision(&self) -> u64 {
        self.camera.preview_revision()
    }
}
