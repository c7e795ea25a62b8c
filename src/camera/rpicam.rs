//! Raspberry Pi camera backend built on the `rpicam-apps` tools.
//!
//! Preview runs `rpicam-vid` streaming MJPEG to stdout; a reader thread
//! decodes frames into a shared slot. Stills run `rpicam-still`, which needs
//! the sensor to itself, so an active preview is stopped first.

use image::{imageops, ImageFormat, RgbaImage};
use parking_lot::Mutex;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

use super::mjpeg::MjpegSplitter;
use super::{Camera, CameraError, CameraSettings};
use crate::overlay::preview_layer;

/// Preview process plus the thread reading its output
struct PreviewStream {
    child: Child,
    reader: Option<JoinHandle<()>>,
}

/// Latest decoded preview frame, written by the reader thread
#[derive(Debug, Default)]
struct FrameSlot {
    frame: Option<RgbaImage>,
    /// Frames decoded since the camera was opened
    decoded: u64,
}

/// Camera driven through `rpicam-vid` / `rpicam-still`
pub struct RpicamCamera {
    settings: CameraSettings,
    preview: Option<PreviewStream>,
    frame_slot: Arc<Mutex<FrameSlot>>,
    /// Overlay fitted to the preview size with its alpha already scaled
    overlay_layer: Option<RgbaImage>,
    overlay_changes: u64,
}

impl std::fmt::Debug for RpicamCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpicamCamera")
            .field("settings", &self.settings)
            .field("previewing", &self.preview.is_some())
            .field("overlay", &self.overlay_layer.as_ref().map(|_| "<overlay>"))
            .finish()
    }
}

impl RpicamCamera {
    pub fn new(settings: CameraSettings) -> Self {
        info!(
            "Camera configured at {}x{} (hflip: {})",
            settings.width, settings.height, settings.hflip
        );
        Self {
            settings,
            preview: None,
            frame_slot: Arc::new(Mutex::new(FrameSlot::default())),
            overlay_layer: None,
            overlay_changes: 0,
        }
    }

    fn common_args(&self) -> Vec<String> {
        let mut args = vec![
            "--nopreview".to_string(),
            "--width".to_string(),
            self.settings.width.to_string(),
            "--height".to_string(),
            self.settings.height.to_string(),
        ];
        if self.settings.hflip {
            args.push("--hflip".to_string());
        }
        args
    }

    fn preview_args(&self) -> Vec<String> {
        let mut args = self.common_args();
        args.extend(
            ["--timeout", "0", "--codec", "mjpeg", "--output", "-"]
                .iter()
                .map(|s| s.to_string()),
        );
        args
    }

    fn still_args(&self, path: &Path) -> Vec<String> {
        let encoding = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("jpeg") => "jpg".to_string(),
            Some(ext) => ext.to_ascii_lowercase(),
            None => "png".to_string(),
        };
        let mut args = self.common_args();
        args.extend([
            "--immediate".to_string(),
            "--encoding".to_string(),
            encoding,
            "--output".to_string(),
            path.to_string_lossy().into_owned(),
        ]);
        args
    }
}

/// Decode MJPEG frames from `source` into `slot` until the stream ends
fn read_preview_stream(mut source: impl Read, slot: Arc<Mutex<FrameSlot>>) {
    let mut splitter = MjpegSplitter::new();
    let mut chunk = [0u8; 64 * 1024];

    loop {
        let n = match source.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                warn!("Preview stream read failed: {}", e);
                break;
            }
        };
        splitter.push(&chunk[..n]);

        while let Some(jpeg) = splitter.next_frame() {
            match image::load_from_memory_with_format(&jpeg, ImageFormat::Jpeg) {
                Ok(frame) => {
                    let frame = frame.to_rgba8();
                    let mut slot = slot.lock();
                    slot.frame = Some(frame);
                    slot.decoded += 1;
                }
                // A torn frame is skipped, the next one usually decodes.
                Err(e) => debug!("Dropping undecodable preview frame: {}", e),
            }
        }
    }

    debug!("Preview reader exiting");
}

impl Camera for RpicamCamera {
    fn start_preview(&mut self) -> Result<(), CameraError> {
        if self.preview.is_some() {
            return Ok(());
        }

        let command = &self.settings.preview_command;
        let mut child = Command::new(command)
            .args(self.preview_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CameraError::Spawn(command.clone(), e))?;

        let spawned = match child.stdout.take() {
            Some(stdout) => {
                let slot = Arc::clone(&self.frame_slot);
                std::thread::Builder::new()
                    .name("preview-reader".to_string())
                    .spawn(move || read_preview_stream(stdout, slot))
                    .map_err(CameraError::Io)
            }
            None => Err(CameraError::PreviewClosed),
        };
        let reader = match spawned {
            Ok(reader) => reader,
            Err(e) => {
                // Nobody would read the stream; don't leave the sensor held.
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        };

        self.preview = Some(PreviewStream {
            child,
            reader: Some(reader),
        });
        info!("Preview started");
        Ok(())
    }

    fn stop_preview(&mut self) -> Result<(), CameraError> {
        let Some(mut stream) = self.preview.take() else {
            return Ok(());
        };

        // Killing an already exited child is fine; wait reaps it either way.
        let _ = stream.child.kill();
        let waited = stream.child.wait();
        if let Some(reader) = stream.reader.take() {
            let _ = reader.join();
        }
        self.frame_slot.lock().frame = None;

        waited?;
        info!("Preview stopped");
        Ok(())
    }

    fn is_previewing(&self) -> bool {
        self.preview.is_some()
    }

    fn add_overlay(&mut self, overlay: RgbaImage, alpha: u8) {
        let layer = preview_layer(&overlay, self.settings.width, self.settings.height, alpha);
        self.overlay_layer = Some(layer);
        self.overlay_changes += 1;
    }

    fn remove_overlays(&mut self) {
        if self.overlay_layer.take().is_some() {
            self.overlay_changes += 1;
        }
    }

    fn capture(&mut self, path: &Path) -> Result<(), CameraError> {
        self.stop_preview()?;

        let command = &self.settings.still_command;
        info!("Capturing still to {:?}", path);
        let status = Command::new(command)
            .args(self.still_args(path))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .map_err(|e| CameraError::Spawn(command.clone(), e))?;

        if !status.success() {
            return Err(CameraError::CommandFailed {
                command: command.clone(),
                status,
            });
        }
        if !path.exists() {
            return Err(CameraError::MissingOutput(path.to_path_buf()));
        }
        Ok(())
    }

    fn preview_frame(&self) -> Option<RgbaImage> {
        self.preview.as_ref()?;
        let mut frame = self.frame_slot.lock().frame.clone()?;
        if let Some(layer) = &self.overlay_layer {
            imageops::overlay(&mut frame, layer, 0, 0);
        }
        Some(frame)
    }

    fn preview_revision(&self) -> u64 {
        self.frame_slot.lock().decoded + self.overlay_changes
    }
}

impl Drop for RpicamCamera {
    fn drop(&mut self) {
        let _ = self.stop_preview();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn settings() -> CameraSettings {
        CameraSettings {
            width: 800,
            height: 480,
            hflip: true,
            preview_command: "rpicam-vid".to_string(),
            still_command: "rpicam-still".to_string(),
        }
    }

    #[test]
    fn test_still_args_follow_extension() {
        let camera = RpicamCamera::new(settings());
        let args = camera.still_args(Path::new("/tmp/image-01-02 03:04.png"));

        assert!(args.contains(&"--hflip".to_string()));
        let enc = args.iter().position(|a| a == "--encoding").unwrap();
        assert_eq!(args[enc + 1], "png");
        assert_eq!(args.last().unwrap(), "/tmp/image-01-02 03:04.png");

        let args = camera.still_args(Path::new("/tmp/x.JPEG"));
        let enc = args.iter().position(|a| a == "--encoding").unwrap();
        assert_eq!(args[enc + 1], "jpg");
    }

    #[test]
    fn test_preview_args_without_flip() {
        let mut s = settings();
        s.hflip = false;
        let camera = RpicamCamera::new(s);
        let args = camera.preview_args();

        assert!(!args.contains(&"--hflip".to_string()));
        let w = args.iter().position(|a| a == "--width").unwrap();
        assert_eq!(args[w + 1], "800");
        assert_eq!(&args[args.len() - 2..], ["--output", "-"]);
    }

    #[test]
    fn test_reader_keeps_latest_frame() {
        let mut stream = Vec::new();
        for shade in [10u8, 200] {
            let img = RgbImage::from_pixel(4, 2, Rgb([shade, shade, shade]));
            let mut jpeg = Cursor::new(Vec::new());
            img.write_to(&mut jpeg, ImageFormat::Jpeg).unwrap();
            stream.extend_from_slice(jpeg.get_ref());
        }

        let slot = Arc::new(Mutex::new(FrameSlot::default()));
        read_preview_stream(Cursor::new(stream), Arc::clone(&slot));

        let slot = slot.lock();
        assert_eq!(slot.decoded, 2);
        let frame = slot.frame.clone().unwrap();
        assert_eq!(frame.dimensions(), (4, 2));
        assert!(frame.get_pixel(0, 0)[0] > 150);
    }

    #[test]
    fn test_overlay_layer_prepared_once_at_preview_size() {
        let mut camera = RpicamCamera::new(settings());
        let revision = camera.preview_revision();

        camera.add_overlay(RgbaImage::from_pixel(8, 6, image::Rgba([0, 0, 255, 255])), 128);
        let layer = camera.overlay_layer.as_ref().unwrap();
        assert_eq!(layer.dimensions(), (800, 480));
        assert_eq!(layer.get_pixel(400, 240)[3], 128);
        assert_eq!(camera.preview_revision(), revision + 1);

        camera.remove_overlays();
        camera.remove_overlays();
        assert!(camera.overlay_layer.is_none());
        assert_eq!(camera.preview_revision(), revision + 2);
    }

    #[test]
    fn test_stop_preview_reaps_child_and_clears_frame() {
        let mut s = settings();
        // Ignores its arguments and exits at once, closing the stream.
        s.preview_command = "true".to_string();
        let mut camera = RpicamCamera::new(s);

        camera.start_preview().unwrap();
        camera.frame_slot.lock().frame = Some(RgbaImage::new(4, 2));
        assert!(camera.preview_frame().is_some());

        camera.stop_preview().unwrap();
        assert!(!camera.is_previewing());
        assert!(camera.frame_slot.lock().frame.is_none());
        assert!(camera.preview_frame().is_none());
    }

    #[test]
    fn test_missing_binary_reports_spawn_error() {
        let mut s = settings();
        s.preview_command = "/nonexistent/rpicam-vid".to_string();
        let mut camera = RpicamCamera::new(s);

        let err = camera.start_preview().unwrap_err();
        assert!(matches!(err, CameraError::Spawn(_, _)));
        assert!(!camera.is_previewing());
    }
}
