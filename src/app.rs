//! Booth Session
//!
//! Holds all mutable booth state and applies queued commands one at a time.
//! Buttons and the window only ever enqueue [`BoothCommand`]s; the dispatcher
//! (window update loop or headless loop) drains the queue on one thread.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use image::RgbaImage;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

use crate::capture::CaptureController;
use crate::input::InputController;
use crate::publish::{PublishError, Publisher};
use crate::shared::{BoothCommand, RuntimeState};

/// How often the headless loop polls keyboard buttons
const HEADLESS_POLL: Duration = Duration::from_millis(50);

/// Stop the dispatcher on Ctrl+C or SIGTERM. The session is then dropped
/// normally, which releases the camera.
pub fn shutdown_on_interrupt(sender: Sender<BoothCommand>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || request_shutdown(&sender))
}

fn request_shutdown(sender: &Sender<BoothCommand>) {
    info!("Interrupt received, shutting down...");
    let _ = sender.send(BoothCommand::Shutdown);
}

/// The photo booth session
pub struct PhotoBooth {
    capture: CaptureController,
    publisher: Option<Publisher>,
    caption: String,
    runtime: RuntimeState,
    to_booth: Sender<BoothCommand>,
    commands: Receiver<BoothCommand>,
    clock: Box<dyn Fn() -> DateTime<Utc>>,
}

impl PhotoBooth {
    /// Create a session. Without a publisher, posting reports an error.
    pub fn new(capture: CaptureController, publisher: Option<Publisher>, caption: String) -> Self {
        let (to_booth, commands) = unbounded();
        let mut booth = Self {
            capture,
            publisher,
            caption,
            runtime: RuntimeState::default(),
            to_booth,
            commands,
            clock: Box::new(Utc::now),
        };
        booth.sync_runtime();
        booth
    }

    /// Replace the wall clock used to name captures
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Sender for input sources and the window
    pub fn command_sender(&self) -> Sender<BoothCommand> {
        self.to_booth.clone()
    }

    /// Enter the idle state: live preview with the current overlay
    pub fn start(&mut self) {
        info!("Photo booth starting");
        self.dispatch(BoothCommand::NewPicture);
    }

    /// Apply one command
    pub fn handle(&mut self, command: BoothCommand) -> Result<()> {
        match command {
            BoothCommand::AdvanceOverlay => {
                self.capture.advance_overlay();
            }
            BoothCommand::Capture => {
                let at = (self.clock)();
                self.capture.take_photo(at)?;
            }
            BoothCommand::NewPicture => {
                self.capture.start_preview()?;
            }
            BoothCommand::PostPicture => {
                let output = self
                    .capture
                    .current_output()
                    .ok_or(PublishError::NoCapture)?;
                let publisher = self
                    .publisher
                    .as_ref()
                    .ok_or_else(|| anyhow!("Posting is not configured"))?;
                let id = publisher
                    .post(output, &self.caption)
                    .with_context(|| format!("Failed to post {:?}", output))?;
                self.runtime.posts_sent += 1;
                self.runtime.last_post_id = Some(id);
            }
            BoothCommand::Shutdown => {}
        }
        Ok(())
    }

    /// Apply one command, containing any failure to that command.
    /// Returns `false` once shutdown was requested.
    pub fn dispatch(&mut self, command: BoothCommand) -> bool {
        let result = self.handle(command);
        self.sync_runtime();

        match result {
            Ok(()) => self.runtime.clear_error(),
            Err(e) => {
                error!("Command '{}' failed: {:#}", command.label(), e);
                self.runtime.set_error(format!("Could not {}: {}", command.label(), e));
            }
        }

        command != BoothCommand::Shutdown
    }

    /// Apply every queued command. Returns `false` once shutdown was requested.
    pub fn drain(&mut self) -> bool {
        while let Ok(command) = self.commands.try_recv() {
            if !self.dispatch(command) {
                return false;
            }
        }
        true
    }

    /// Dispatcher loop without a window
    pub fn run_headless(&mut self, input: &InputController) {
        info!("Running headless; waiting for button presses");
        loop {
            input.poll();
            match self.commands.recv_timeout(HEADLESS_POLL) {
                Ok(command) => {
                    if !self.dispatch(command) || !self.drain() {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        info!("Dispatcher stopped");
    }

    fn sync_runtime(&mut self) {
        self.runtime.previewing = self.capture.is_previewing();
        self.runtime.overlay_index = self.capture.overlay_index();
        self.runtime.overlay_count = self.capture.overlay_count();
        self.runtime.last_output = self.capture.current_output().map(Path::to_path_buf);
        self.runtime.thumbnail_generation = self.capture.thumbnail_generation();
    }

    pub fn runtime(&self) -> &RuntimeState {
        &self.runtime
    }

    pub fn thumbnail_path(&self) -> &Path {
        self.capture.thumbnail_path()
    }

    pub fn preview_frame(&self) -> Option<RgbaImage> {
        self.capture.preview_frame()
    }

    pub fn preview_revision(&self) -> u64 {
        self.capture.preview_revision()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::fake::FakeCamera;
    use crate::capture::CaptureConfig;
    use crate::config::PublishSettings;
    use crate::display::picture::PictureView;
    use crate::overlay::{Overlay, OverlayLibrary};
    use crate::publish::fake::FakeSocialClient;
    use chrono::TimeZone;
    use image::Rgba;
    use std::path::PathBuf;

    struct Fixture {
        _dir: tempfile::TempDir,
        images_dir: PathBuf,
        booth: PhotoBooth,
        social: FakeSocialClient,
    }

    fn fixture(overlay_count: usize, with_publisher: bool) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let images_dir = dir.path().join("images");
        let config = CaptureConfig {
            images_dir: images_dir.clone(),
            extension: "png".to_string(),
            unique_names: false,
            thumbnail_path: dir.path().join("latest.gif"),
            preview_alpha: 128,
        };
        let overlays = OverlayLibrary::from_overlays(
            (0..overlay_count)
                .map(|i| Overlay {
                    name: format!("frame-{}", i),
                    image: RgbaImage::from_pixel(4, 4, Rgba([(i * 60) as u8, 0, 0, 90])),
                })
                .collect(),
        );
        let capture =
            CaptureController::new(Box::new(FakeCamera::new(640, 480)), overlays, config);

        let social = FakeSocialClient::default();
        let publisher = with_publisher.then(|| Publisher::new(Box::new(social.clone())));
        let booth = PhotoBooth::new(capture, publisher, PublishSettings::default().caption)
            .with_clock(|| Utc.with_ymd_and_hms(2018, 4, 21, 10, 15, 0).unwrap());

        Fixture {
            _dir: dir,
            images_dir,
            booth,
            social,
        }
    }

    #[test]
    fn test_end_to_end_session() {
        let mut f = fixture(3, true);
        let tx = f.booth.command_sender();

        f.booth.start();
        assert!(f.booth.runtime().previewing);

        tx.send(BoothCommand::AdvanceOverlay).unwrap();
        tx.send(BoothCommand::AdvanceOverlay).unwrap();
        assert!(f.booth.drain());
        assert_eq!(f.booth.runtime().overlay_index, 2 % 3);

        let ctx = egui::Context::default();
        let mut picture = PictureView::new(f.booth.thumbnail_path().to_path_buf());
        picture.observe(f.booth.runtime().thumbnail_generation);
        picture.refresh(&ctx);
        assert!(picture.texture_size().is_none());

        tx.send(BoothCommand::Capture).unwrap();
        assert!(f.booth.drain());

        let expected = f.images_dir.join("image-21-04 10:15.png");
        let runtime = f.booth.runtime().clone();
        assert!(expected.exists());
        assert_eq!(runtime.last_output.as_deref(), Some(expected.as_path()));
        assert!(!runtime.previewing);
        assert_eq!(runtime.thumbnail_generation, 1);
        assert!(runtime.last_error.is_none());

        picture.observe(runtime.thumbnail_generation);
        assert!(picture.needs_reload());
        picture.refresh(&ctx);
        assert_eq!(picture.texture_size(), Some([400, 300]));

        tx.send(BoothCommand::PostPicture).unwrap();
        assert!(f.booth.drain());

        let calls = f.social.calls.lock();
        assert_eq!(calls.uploads, vec![std::fs::read(&expected).unwrap()]);
        assert_eq!(calls.statuses.len(), 1);
        assert_eq!(
            calls.statuses[0].0,
            "CNY Regional Making and Innovation Conference #cnymakers18"
        );
        assert_eq!(calls.statuses[0].1 .0, "media-1");
        assert_eq!(f.booth.runtime().posts_sent, 1);
        assert_eq!(f.booth.runtime().last_post_id.as_deref(), Some("status-1"));
    }

    #[test]
    fn test_post_before_capture_keeps_kiosk_alive() {
        let mut f = fixture(2, true);
        f.booth.start();

        assert!(f.booth.dispatch(BoothCommand::PostPicture));
        assert!(f.booth.runtime().last_error.is_some());
        assert!(f.social.calls.lock().uploads.is_empty());

        assert!(f.booth.dispatch(BoothCommand::AdvanceOverlay));
        assert!(f.booth.runtime().last_error.is_none());
        assert_eq!(f.booth.runtime().overlay_index, 1);
    }

    #[test]
    fn test_post_without_publisher_reports_error() {
        let mut f = fixture(1, false);
        f.booth.start();
        f.booth.dispatch(BoothCommand::Capture);
        assert!(f.booth.runtime().last_error.is_none());

        f.booth.dispatch(BoothCommand::PostPicture);
        let message = f.booth.runtime().last_error.clone().unwrap();
        assert!(message.contains("not configured"), "{}", message);
    }

    #[test]
    fn test_new_picture_resumes_preview() {
        let mut f = fixture(2, true);
        f.booth.start();
        f.booth.dispatch(BoothCommand::Capture);
        assert!(!f.booth.runtime().previewing);
        assert!(f.booth.preview_frame().is_none());

        f.booth.dispatch(BoothCommand::NewPicture);
        assert!(f.booth.runtime().previewing);
        assert!(f.booth.preview_frame().is_some());
    }

    #[test]
    fn test_shutdown_stops_drain() {
        let mut f = fixture(0, false);
        let tx = f.booth.command_sender();
        tx.send(BoothCommand::Shutdown).unwrap();
        tx.send(BoothCommand::AdvanceOverlay).unwrap();

        assert!(!f.booth.drain());
        assert_eq!(f.booth.runtime().overlay_index, 0);
    }

    #[test]
    fn test_headless_loop_exits_on_shutdown() {
        let mut f = fixture(2, false);
        let tx = f.booth.command_sender();
        tx.send(BoothCommand::AdvanceOverlay).unwrap();
        tx.send(BoothCommand::Shutdown).unwrap();

        f.booth.run_headless(&InputController::disabled());
        assert_eq!(f.booth.runtime().overlay_index, 1);
    }

    #[test]
    fn test_interrupt_stops_headless_loop() {
        let mut f = fixture(2, false);
        let tx = f.booth.command_sender();
        f.booth.start();

        let interrupter = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            request_shutdown(&tx);
        });

        f.booth.run_headless(&InputController::disabled());
        interrupter.join().unwrap();
        assert!(f.booth.runtime().last_error.is_none());
    }
}
