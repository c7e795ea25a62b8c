//! Photo Booth - kiosk controller
//!
//! Two buttons drive a camera: one cycles the overlay frame, the other takes
//! a picture. The window shows the latest shot and can post it online.

mod app;
mod camera;
mod capture;
mod config;
mod credentials;
mod display;
mod input;
mod overlay;
mod publish;
mod shared;
mod storage;

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::app::{shutdown_on_interrupt, PhotoBooth};
use crate::camera::RpicamCamera;
use crate::capture::CaptureController;
use crate::config::AppConfig;
use crate::credentials::Credentials;
use crate::input::InputController;
use crate::overlay::OverlayLibrary;
use crate::publish::{BlockingTwitter, Publisher, TwitterClient};

/// Photo Booth - button driven camera kiosk
#[derive(Parser, Debug)]
#[command(name = "photo-booth")]
#[command(about = "Kiosk photo booth: overlays, capture and posting")]
struct Args {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run without a window; only the physical buttons drive the booth
    #[arg(long)]
    headless: bool,

    /// List the overlays that would be cycled and exit
    #[arg(long)]
    list_overlays: bool,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    write_config: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => storage::get_config_dir()?.join("config.toml"),
    };
    let config = load_or_create_config(&config_path);

    if args.write_config {
        config::save_config(&config, &config_path)?;
        println!("Wrote configuration to {}", config_path.display());
        return Ok(());
    }

    let overlays = OverlayLibrary::load_dir(&config.overlays.dir).unwrap_or_else(|e| {
        warn!("Continuing without overlays: {}", e);
        OverlayLibrary::default()
    });

    if args.list_overlays {
        println!("Overlays in {}:", config.overlays.dir.display());
        if overlays.is_empty() {
            println!("  (none)");
        }
        for (i, name) in overlays.names().enumerate() {
            println!("  [{}] {}", i, name);
        }
        return Ok(());
    }

    info!("Photo booth starting...");

    let camera = RpicamCamera::new((&config.camera).into());
    let capture = CaptureController::new(Box::new(camera), overlays, (&config).into());
    let publisher = build_publisher(&config, config_path.parent());
    let booth = PhotoBooth::new(capture, publisher, config.publish.caption.clone());
    let input = InputController::start(&config.buttons, booth.command_sender());
    shutdown_on_interrupt(booth.command_sender())?;

    if args.headless {
        run_headless(booth, input);
    } else {
        display::run_kiosk(booth, input, config.general.clone())
            .map_err(|e| anyhow!("Display error: {}", e))?;
    }

    info!("Photo booth shutdown complete");
    Ok(())
}

/// Load configuration from file or fall back to defaults
fn load_or_create_config(path: &Path) -> AppConfig {
    if path.exists() {
        match config::load_config(path) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", path);
                return config;
            }
            Err(e) => warn!("Ignoring invalid configuration {:?}: {}", path, e),
        }
    }
    info!("Using default configuration");
    AppConfig::default()
}

/// Posting needs all four credentials; without them the booth still runs
fn build_publisher(config: &AppConfig, config_dir: Option<&Path>) -> Option<Publisher> {
    let credentials_path = config_dir
        .unwrap_or_else(|| Path::new("."))
        .join("credentials.toml");

    let credentials = match Credentials::load(&credentials_path) {
        Ok(credentials) => credentials,
        Err(e) => {
            warn!("Posting disabled: {}", e);
            return None;
        }
    };

    let client = TwitterClient::new(credentials, &config.publish)
        .and_then(BlockingTwitter::new)
        .map_err(|e| warn!("Posting disabled: {}", e))
        .ok()?;
    Some(Publisher::new(Box::new(client)))
}

fn run_headless(mut booth: PhotoBooth, input: InputController) {
    booth.start();
    booth.run_headless(&input);
}
