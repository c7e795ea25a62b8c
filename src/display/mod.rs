//! Display Controller
//!
//! The kiosk window: a status line, the latest thumbnail and two buttons.
//! While the camera previews, the live feed fills the window instead.

pub mod app;
pub mod picture;
pub mod theme;

pub use app::{run_kiosk, KioskApp};
