//! Input Controller
//!
//! Maps the two physical buttons to booth commands. Buttons can be wired as
//! keyboard-emulating encoders, or with the `gpio` feature straight to the
//! Pi's header. Debouncing is left to the hardware and the libraries.

pub mod keys;
#[cfg(feature = "gpio")]
pub mod gpio;

use crossbeam_channel::Sender;
use tracing::{info, warn};

use crate::config::ButtonSettings;
use crate::shared::BoothCommand;
use keys::KeyButtons;

/// The two logical button actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    AdvanceOverlay,
    Capture,
}

impl ButtonAction {
    pub fn command(self) -> BoothCommand {
        match self {
            ButtonAction::AdvanceOverlay => BoothCommand::AdvanceOverlay,
            ButtonAction::Capture => BoothCommand::Capture,
        }
    }
}

/// Command for a GPIO edge on a button's line. Buttons pull the line to
/// ground, so only a falling edge is a press.
#[cfg_attr(not(feature = "gpio"), allow(dead_code))]
pub fn edge_command(action: ButtonAction, falling: bool) -> Option<BoothCommand> {
    falling.then(|| action.command())
}

/// Keys to register, skipping buttons left unbound
fn key_bindings(config: &ButtonSettings) -> Vec<(&str, ButtonAction)> {
    [
        (config.advance_key.as_str(), ButtonAction::AdvanceOverlay),
        (config.capture_key.as_str(), ButtonAction::Capture),
    ]
    .into_iter()
    .filter_map(|(key, action)| Some((ButtonSettings::bound_key(key)?, action)))
    .collect()
}

/// All active button sources
pub struct InputController {
    keys: Option<KeyButtons>,
    #[cfg(feature = "gpio")]
    _gpio: Option<gpio::GpioButtons>,
}

impl InputController {
    /// Bind every configured source. A source that fails is logged and
    /// skipped so the kiosk still runs with the window buttons.
    pub fn start(config: &ButtonSettings, sender: Sender<BoothCommand>) -> Self {
        let bindings = key_bindings(config);
        let keys = if bindings.is_empty() {
            info!("No keyboard buttons configured");
            None
        } else {
            KeyButtons::bind(&bindings, sender.clone())
                .map_err(|e| warn!("Keyboard buttons unavailable: {}", e))
                .ok()
        };

        #[cfg(feature = "gpio")]
        let _gpio = gpio::GpioButtons::bind(
            &[
                (config.advance_pin, ButtonAction::AdvanceOverlay),
                (config.capture_pin, ButtonAction::Capture),
            ],
            sender,
        )
        .map_err(|e| warn!("GPIO buttons unavailable: {}", e))
        .ok();

        #[cfg(not(feature = "gpio"))]
        drop(sender);

        Self {
            keys,
            #[cfg(feature = "gpio")]
            _gpio,
        }
    }

    /// An input controller with no sources, for the window buttons only
    pub fn disabled() -> Self {
        Self {
            keys: None,
            #[cfg(feature = "gpio")]
            _gpio: None,
        }
    }

    /// Forward pending key presses. GPIO presses arrive on their own.
    pub fn poll(&self) {
        if let Some(keys) = &self.keys {
            keys.poll();
        }
    }
}
