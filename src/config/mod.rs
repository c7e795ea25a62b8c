//! Application Configuration
//!
//! Kiosk settings stored in TOML format. Every section has defaults matching
//! the stock installation, so an empty or partial file is valid.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Camera settings
    pub camera: CameraSettings,
    /// Where captures and the thumbnail are written
    pub storage: StorageSettings,
    /// Overlay assets
    pub overlays: OverlaySettings,
    /// Physical button bindings
    pub buttons: ButtonSettings,
    /// Social posting
    pub publish: PublishSettings,
}

/// General kiosk settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Window title (installation name)
    pub title: String,
    /// Status line shown above the picture
    pub status_message: String,
    /// Window width in pixels
    pub window_width: f32,
    /// Window height in pixels
    pub window_height: f32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            title: "Library Photo Booth".to_string(),
            status_message: "Post A Picture On Our Twitter Page!".to_string(),
            window_width: 800.0,
            window_height: 480.0,
        }
    }
}

/// Camera settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Capture and preview width
    pub width: u32,
    /// Capture and preview height
    pub height: u32,
    /// Mirror the image horizontally
    pub hflip: bool,
    /// Alpha used when compositing the overlay on the live preview
    pub preview_alpha: u8,
    /// Program streaming MJPEG preview frames to stdout
    pub preview_command: String,
    /// Program writing one still frame to a file
    pub still_command: String,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 480,
            hflip: true,
            preview_alpha: 128,
            preview_command: "rpicam-vid".to_string(),
            still_command: "rpicam-still".to_string(),
        }
    }
}

/// Capture output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory receiving full-size captures
    pub images_dir: PathBuf,
    /// Fixed path of the on-screen thumbnail (GIF)
    pub thumbnail_path: PathBuf,
    /// Capture file extension, also selects the encoder
    pub extension: String,
    /// Append seconds to capture names so same-minute captures do not collide
    pub unique_names: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from("/home/pi/photoBooth/images"),
            thumbnail_path: PathBuf::from("/home/pi/photoBooth/latest.gif"),
            extension: "png".to_string(),
            unique_names: false,
        }
    }
}

/// Overlay asset settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    /// Directory holding overlay PNGs
    pub dir: PathBuf,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/home/pi/photoBooth/overlays"),
        }
    }
}

/// Button bindings. An empty key leaves that button unbound.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonSettings {
    /// Key emitted by the "next overlay" button
    pub advance_key: String,
    /// Key emitted by the "take picture" button
    pub capture_key: String,
    /// BCM pin of the "next overlay" button
    pub advance_pin: u8,
    /// BCM pin of the "take picture" button
    pub capture_pin: u8,
}

impl Default for ButtonSettings {
    fn default() -> Self {
        Self {
            advance_key: "N".to_string(),
            capture_key: "Space".to_string(),
            advance_pin: 23,
            capture_pin: 25,
        }
    }
}

impl ButtonSettings {
    /// Configured key, or `None` when left empty
    pub fn bound_key(key: &str) -> Option<&str> {
        let key = key.trim();
        (!key.is_empty()).then_some(key)
    }
}

/// Social posting settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishSettings {
    /// Caption attached to every post
    pub caption: String,
    /// Media upload base URL
    pub upload_base_url: String,
    /// Status API base URL
    pub api_base_url: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            caption: "CNY Regional Making and Innovation Conference #cnymakers18".to_string(),
            upload_base_url: "https://upload.twitter.com".to_string(),
            api_base_url: "https://api.twitter.com".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
