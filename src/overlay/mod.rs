//! Overlay Provider
//!
//! Loads the overlay frames from a directory and hands them out in a fixed
//! cyclic order. Compositing onto preview frames and captures lives in
//! [`compose`].

pub mod compose;

use image::RgbaImage;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use compose::{burn_in, preview_layer};

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("overlay directory {0:?} could not be read: {1}")]
    Directory(PathBuf, #[source] std::io::Error),
    #[error("failed to decode overlay {0:?}: {1}")]
    Decode(PathBuf, #[source] image::ImageError),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// A single overlay frame
#[derive(Debug, Clone)]
pub struct Overlay {
    /// File stem, used in logs and the UI
    pub name: String,
    /// Decoded RGBA pixels
    pub image: RgbaImage,
}

/// Ordered overlay set with a wrapping cursor
#[derive(Debug, Default)]
pub struct OverlayLibrary {
    overlays: Vec<Overlay>,
    cursor: usize,
}

impl OverlayLibrary {
    /// Build a library from already decoded overlays
    pub fn from_overlays(overlays: Vec<Overlay>) -> Self {
        Self { overlays, cursor: 0 }
    }

    /// Load every `.png` in `dir`, ordered by file name
    pub fn load_dir(dir: &Path) -> Result<Self, OverlayError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| OverlayError::Directory(dir.to_path_buf(), e))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("png"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        let mut overlays = Vec::with_capacity(paths.len());
        for path in paths {
            let image = image::open(&path)
                .map_err(|e| OverlayError::Decode(path.clone(), e))?
                .to_rgba8();
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            debug!("Loaded overlay '{}' ({}x{})", name, image.width(), image.height());
            overlays.push(Overlay { name, image });
        }

        if overlays.is_empty() {
            warn!("No overlays found in {:?}", dir);
        } else {
            info!("Loaded {} overlays from {:?}", overlays.len(), dir);
        }

        Ok(Self::from_overlays(overlays))
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Index of the selected overlay
    pub fn current_index(&self) -> usize {
        self.cursor
    }

    /// The selected overlay, if any are loaded
    pub fn current(&self) -> Option<&Overlay> {
        self.overlays.get(self.cursor)
    }

    /// Move to the next overlay, wrapping after the last one
    pub fn advance(&mut self) -> Option<&Overlay> {
        if self.overlays.is_empty() {
            return None;
        }
        self.cursor = (self.cursor + 1) % self.overlays.len();
        self.current()
    }

    /// Names in cycle order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.overlays.iter().map(|o| o.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(name: &str, color: [u8; 4]) -> Overlay {
        Overlay {
            name: name.to_string(),
            image: RgbaImage::from_pixel(4, 4, Rgba(color)),
        }
    }

    #[test]
    fn test_cursor_wraps_after_full_cycle() {
        let mut library = OverlayLibrary::from_overlays(vec![
            solid("a", [255, 0, 0, 255]),
            solid("b", [0, 255, 0, 255]),
            solid("c", [0, 0, 255, 255]),
        ]);
        assert_eq!(library.current_index(), 0);

        let n = library.len();
        let mut seen = Vec::new();
        for _ in 0..n {
            seen.push(library.advance().unwrap().name.clone());
        }
        assert_eq!(seen, vec!["b", "c", "a"]);
        assert_eq!(library.current_index(), 0);

        for presses in 1..=(3 * n) {
            library.advance();
            assert_eq!(library.current_index(), presses % n);
        }
    }

    #[test]
    fn test_empty_library_never_advances() {
        let mut library = OverlayLibrary::default();
        assert!(library.is_empty());
        assert!(library.advance().is_none());
        assert!(library.current().is_none());
        assert_eq!(library.current_index(), 0);
    }

    #[test]
    fn test_load_dir_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]))
            .save(dir.path().join("02-hat.png"))
            .unwrap();
        RgbaImage::from_pixel(2, 2, Rgba([4, 5, 6, 255]))
            .save(dir.path().join("01-frame.PNG"))
            .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not an overlay").unwrap();

        let library = OverlayLibrary::load_dir(dir.path()).unwrap();
        let names: Vec<&str> = library.names().collect();
        assert_eq!(names, vec!["01-frame", "02-hat"]);
    }

    #[test]
    fn test_load_missing_dir_fails() {
        let result = OverlayLibrary::load_dir(Path::new("/nonexistent/overlays"));
        assert!(matches!(result, Err(OverlayError::Directory(_, _))));
    }
}
