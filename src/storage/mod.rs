//! Storage Layer
//!
//! Locates the configuration directory and names capture files.

pub mod naming;

use anyhow::Result;
use std::path::PathBuf;

pub use naming::capture_path;

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("org", "photobooth", "PhotoBooth")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}
