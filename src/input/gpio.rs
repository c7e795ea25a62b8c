//! GPIO push buttons (Raspberry Pi)
//!
//! Buttons pull the line to ground, so a press is a falling edge on a
//! pulled-up input. rppal delivers edges on its own interrupt thread.

use crossbeam_channel::Sender;
use rppal::gpio::{Event, Gpio, InputPin, Trigger};
use tracing::{debug, info};

use super::{edge_command, ButtonAction};
use crate::shared::BoothCommand;

/// Held input pins; interrupts stop when this is dropped
pub struct GpioButtons {
    _pins: Vec<InputPin>,
}

impl GpioButtons {
    pub fn bind(
        pins: &[(u8, ButtonAction)],
        sender: Sender<BoothCommand>,
    ) -> Result<Self, rppal::gpio::Error> {
        let gpio = Gpio::new()?;
        let mut held = Vec::with_capacity(pins.len());

        for &(bcm, action) in pins {
            let mut pin = gpio.get(bcm)?.into_input_pullup();
            let tx = sender.clone();
            pin.set_async_interrupt(Trigger::FallingEdge, None, move |event: Event| {
                let falling = matches!(event.trigger, Trigger::FallingEdge);
                if let Some(command) = edge_command(action, falling) {
                    debug!("GPIO press: {:?}", action);
                    let _ = tx.send(command);
                }
            })?;
            info!("Bound GPIO {} to {:?}", bcm, action);
            held.push(pin);
        }

        Ok(Self { _pins: held })
    }
}
