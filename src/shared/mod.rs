//! Commands and runtime status shared by the input sources, the dispatcher
//! and the kiosk window.

pub mod state;
pub mod messages;

pub use state::RuntimeState;
pub use messages::BoothCommand;
