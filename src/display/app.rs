//! Kiosk window entry point

use eframe::egui;
use egui::RichText;
use std::time::Duration;
use tracing::info;

use crate::app::PhotoBooth;
use crate::config::GeneralConfig;
use crate::display::picture::PictureView;
use crate::display::theme::{self, ThemeColors};
use crate::input::InputController;
use crate::shared::BoothCommand;

/// How often the window wakes up to poll buttons while idle
const IDLE_REPAINT: Duration = Duration::from_millis(50);

/// Preview redraw pacing, about the camera's frame rate
const PREVIEW_REPAINT: Duration = Duration::from_millis(33);

const NEW_PICTURE_LABEL: &str = "New picture";
const POST_PICTURE_LABEL: &str = "Tweet Picture";

/// The kiosk window. Its update loop is the booth's dispatcher.
pub struct KioskApp {
    booth: PhotoBooth,
    input: InputController,
    config: GeneralConfig,
    picture: PictureView,
    preview_texture: Option<egui::TextureHandle>,
    /// Preview revision currently uploaded to `preview_texture`
    preview_revision: Option<u64>,
    theme_applied: bool,
}

impl KioskApp {
    pub fn new(booth: PhotoBooth, input: InputController, config: GeneralConfig) -> Self {
        let picture = PictureView::new(booth.thumbnail_path().to_path_buf());
        Self {
            booth,
            input,
            config,
            picture,
            preview_texture: None,
            preview_revision: None,
            theme_applied: false,
        }
    }

    /// Create eframe options for the kiosk window
    pub fn options(config: &GeneralConfig) -> eframe::NativeOptions {
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([config.window_width, config.window_height])
                .with_resizable(false)
                .with_title(config.title.clone()),
            ..Default::default()
        }
    }

    /// Upload the preview frame if it changed since the last upload
    fn refresh_preview(&mut self, ctx: &egui::Context) {
        let revision = self.booth.preview_revision();
        if self.preview_revision == Some(revision) {
            return;
        }
        if let Some(frame) = self.booth.preview_frame() {
            let size = [frame.width() as usize, frame.height() as usize];
            let color_image = egui::ColorImage::from_rgba_unmultiplied(size, frame.as_raw());
            match &mut self.preview_texture {
                Some(texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
                None => {
                    self.preview_texture = Some(ctx.load_texture(
                        "live_preview",
                        color_image,
                        egui::TextureOptions::LINEAR,
                    ));
                }
            }
            self.preview_revision = Some(revision);
        }
    }

    fn render_preview(&mut self, ui: &mut egui::Ui) {
        self.refresh_preview(ui.ctx());

        let available = ui.available_size();
        ui.centered_and_justified(|ui| match &self.preview_texture {
            Some(texture) => {
                let tex_size = texture.size_vec2();
                let scale = (available.x / tex_size.x).min(available.y / tex_size.y);
                ui.image((texture.id(), tex_size * scale));
            }
            None => {
                ui.label(RichText::new("Starting camera...").color(ThemeColors::TEXT_MUTED));
            }
        });
    }

    fn render_booth(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(8.0);
            ui.heading(RichText::new(&self.config.status_message).strong());

            if let Some(error) = &self.booth.runtime().last_error {
                ui.label(RichText::new(error).color(ThemeColors::ACCENT_ERROR));
            } else if let Some(id) = &self.booth.runtime().last_post_id {
                ui.label(
                    RichText::new(format!("Posted! ({})", id)).color(ThemeColors::TEXT_SECONDARY),
                );
            }

            ui.add_space(8.0);
            let picture_space = egui::vec2(400.0, (ui.available_height() - 90.0).max(100.0));
            self.picture.show(ui, picture_space);
            ui.add_space(12.0);
        });

        ui.with_layout(egui::Layout::bottom_up(egui::Align::Center), |ui| {
            ui.add_space(12.0);
            ui.horizontal(|ui| {
                let button_size = egui::vec2(220.0, 56.0);
                let margin = (ui.available_width() - 2.0 * button_size.x - 24.0).max(0.0) / 2.0;
                ui.add_space(margin);

                if ui
                    .add(egui::Button::new(NEW_PICTURE_LABEL).min_size(button_size))
                    .clicked()
                {
                    let _ = self.booth.command_sender().send(BoothCommand::NewPicture);
                }

                ui.add_space(24.0);

                if ui
                    .add(
                        egui::Button::new(
                            RichText::new(POST_PICTURE_LABEL).color(egui::Color32::WHITE),
                        )
                        .fill(ThemeColors::ACCENT_SUCCESS)
                        .min_size(button_size),
                    )
                    .clicked()
                {
                    let _ = self.booth.command_sender().send(BoothCommand::PostPicture);
                }
            });
        });
    }
}

impl eframe::App for KioskApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.theme_applied {
            theme::apply_theme(ctx);
            self.theme_applied = true;
        }

        // Buttons first, then apply everything they queued
        self.input.poll();
        if !self.booth.drain() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        }
        self.picture.observe(self.booth.runtime().thumbnail_generation);

        let previewing = self.booth.runtime().previewing;
        if !previewing {
            self.preview_texture = None;
            self.preview_revision = None;
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            if previewing {
                self.render_preview(ui);
            } else {
                self.render_booth(ui);
            }
        });

        ctx.request_repaint_after(if previewing {
            PREVIEW_REPAINT
        } else {
            IDLE_REPAINT
        });
    }
}

/// Run the kiosk window (blocking)
pub fn run_kiosk(
    mut booth: PhotoBooth,
    input: InputController,
    config: GeneralConfig,
) -> Result<(), eframe::Error> {
    booth.start();
    info!("Opening kiosk window '{}'", config.title);

    let options = KioskApp::options(&config);
    let title = config.title.clone();
    let app = KioskApp::new(booth, input, config);
    eframe::run_native(&title, options, Box::new(|_cc| Ok(Box::new(app))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::fake::FakeCamera;
    use crate::capture::{CaptureConfig, CaptureController};
    use crate::overlay::OverlayLibrary;

    fn kiosk(dir: &std::path::Path) -> KioskApp {
        let config = CaptureConfig {
            images_dir: dir.join("images"),
            extension: "png".to_string(),
            unique_names: false,
            thumbnail_path: dir.join("latest.gif"),
            preview_alpha: 128,
        };
        let capture = CaptureController::new(
            Box::new(FakeCamera::new(64, 48)),
            OverlayLibrary::default(),
            config,
        );
        let mut booth = PhotoBooth::new(capture, None, String::new());
        booth.start();
        KioskApp::new(booth, InputController::disabled(), GeneralConfig::default())
    }

    #[test]
    fn test_preview_uploaded_only_when_revision_moves() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = kiosk(dir.path());
        let ctx = egui::Context::default();

        app.refresh_preview(&ctx);
        assert_eq!(app.preview_texture.as_ref().map(|t| t.size()), Some([64, 48]));
        assert_eq!(app.preview_revision, Some(app.booth.preview_revision()));

        // Unchanged revision: the existing texture is kept as is.
        app.preview_texture = None;
        app.refresh_preview(&ctx);
        assert!(app.preview_texture.is_none());

        app.booth.dispatch(BoothCommand::AdvanceOverlay);
        app.refresh_preview(&ctx);
        assert!(app.preview_texture.is_some());
        assert_eq!(app.preview_revision, Some(app.booth.preview_revision()));
    }
}
