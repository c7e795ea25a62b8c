//! Keyboard-emulating buttons
//!
//! Arcade button encoders show up as a USB keyboard. Each button is bound
//! to a global hotkey so presses register even while the preview has focus.

use anyhow::{anyhow, Result};
use crossbeam_channel::Sender;
use global_hotkey::{hotkey::HotKey, GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use tracing::{debug, info, warn};

use super::ButtonAction;
use crate::shared::BoothCommand;

/// Parse a button binding such as "N", "Space" or "Ctrl+F9".
/// Key and modifier names follow `global-hotkey`'s own grammar.
pub fn parse_key(binding: &str) -> Result<HotKey> {
    binding
        .parse::<HotKey>()
        .map_err(|e| anyhow!("Invalid key '{}': {}", binding, e))
}

/// Which action a hotkey id maps to
fn action_for(bindings: &[(HotKey, ButtonAction)], id: u32) -> Option<ButtonAction> {
    bindings
        .iter()
        .find(|(hotkey, _)| hotkey.id() == id)
        .map(|(_, action)| *action)
}

/// Global hotkeys bound to the two booth buttons
pub struct KeyButtons {
    manager: GlobalHotKeyManager,
    bindings: Vec<(HotKey, ButtonAction)>,
    sender: Sender<BoothCommand>,
}

impl KeyButtons {
    /// Register every key. Keys that fail to parse or register are skipped
    /// with a warning.
    pub fn bind(keys: &[(&str, ButtonAction)], sender: Sender<BoothCommand>) -> Result<Self> {
        let manager = GlobalHotKeyManager::new()
            .map_err(|e| anyhow!("Failed to create hotkey manager: {:?}", e))?;

        let mut bindings = Vec::new();
        for &(key, action) in keys {
            let hotkey = match parse_key(key) {
                Ok(hotkey) => hotkey,
                Err(e) => {
                    warn!("Failed to parse key '{}' for {:?}: {}", key, action, e);
                    continue;
                }
            };
            match manager.register(hotkey) {
                Ok(()) => {
                    info!("Bound key '{}' to {:?}", key, action);
                    bindings.push((hotkey, action));
                }
                Err(e) => warn!("Failed to register key '{}': {:?}", key, e),
            }
        }

        Ok(Self {
            manager,
            bindings,
            sender,
        })
    }

    /// Forward pending key presses as commands. Releases are ignored.
    pub fn poll(&self) {
        while let Ok(event) = GlobalHotKeyEvent::receiver().try_recv() {
            if !matches!(event.state, HotKeyState::Pressed) {
                continue;
            }
            if let Some(action) = action_for(&self.bindings, event.id) {
                debug!("Key press: {:?}", action);
                let _ = self.sender.send(action.command());
            }
        }
    }
}

impl Drop for KeyButtons {
    fn drop(&mut self) {
        for (hotkey, _) in &self.bindings {
            let _ = self.manager.unregister(*hotkey);
        }
    }
}
