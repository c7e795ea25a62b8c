//! Picture element bound to a file on disk

use anyhow::{Context, Result};
use egui::{ColorImage, TextureHandle, TextureOptions, Vec2};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::display::theme::ThemeColors;

/// Decode the image at `path` into an egui image
pub fn load_color_image(path: &Path) -> Result<ColorImage> {
    let rgba = image::open(path)
        .with_context(|| format!("Failed to open {:?}", path))?
        .to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

/// Shows the image at a fixed path and re-reads it on request
pub struct PictureView {
    path: PathBuf,
    texture: Option<TextureHandle>,
    dirty: bool,
    seen_generation: Option<u64>,
}

impl std::fmt::Debug for PictureView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PictureView")
            .field("path", &self.path)
            .field("texture", &self.texture.as_ref().map(|_| "<texture>"))
            .field("dirty", &self.dirty)
            .field("seen_generation", &self.seen_generation)
            .finish()
    }
}

impl PictureView {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            texture: None,
            dirty: true,
            seen_generation: None,
        }
    }

    /// Re-read the bound file on the next frame
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Invalidate when the file's generation counter moved.
    /// The first observation only records the generation.
    pub fn observe(&mut self, generation: u64) {
        if let Some(seen) = self.seen_generation {
            if seen != generation {
                self.invalidate();
            }
        }
        self.seen_generation = Some(generation);
    }

    pub fn needs_reload(&self) -> bool {
        self.dirty
    }

    /// Size of the loaded picture, if one is shown
    pub fn texture_size(&self) -> Option<[usize; 2]> {
        self.texture.as_ref().map(|t| t.size())
    }

    /// Re-read the bound file if it was invalidated
    pub fn refresh(&mut self, ctx: &egui::Context) {
        if !self.dirty {
            return;
        }
        self.dirty = false;
        match load_color_image(&self.path) {
            Ok(image) => match &mut self.texture {
                Some(texture) => texture.set(image, TextureOptions::LINEAR),
                None => {
                    self.texture = Some(ctx.load_texture("picture", image, TextureOptions::LINEAR));
                }
            },
            Err(e) => {
                // Nothing captured yet, or the file is mid-write.
                debug!("Picture not loaded: {:#}", e);
                self.texture = None;
            }
        }
    }

    /// Draw the picture scaled to fit `max`
    pub fn show(&mut self, ui: &mut egui::Ui, max: Vec2) {
        self.refresh(ui.ctx());

        match &self.texture {
            Some(texture) => {
                let size = texture.size_vec2();
                let scale = (max.x / size.x).min(max.y / size.y).min(1.0);
                ui.image((texture.id(), size * scale));
            }
            None => {
                ui.label(
                    egui::RichText::new("Press the button to take a picture")
                        .color(ThemeColors::TEXT_MUTED),
                );
            }
        }
    }
}
