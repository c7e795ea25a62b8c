//! Commands queued for the dispatcher

/// Everything that can happen to the booth, from buttons or the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoothCommand {
    /// Physical button A: select the next overlay
    AdvanceOverlay,
    /// Physical button B: take a photo
    Capture,
    /// "New picture" button: resume the live preview
    NewPicture,
    /// "Tweet Picture" button: post the latest capture
    PostPicture,
    /// Stop the dispatcher
    Shutdown,
}

impl BoothCommand {
    pub fn label(&self) -> &'static str {
        match self {
            BoothCommand::AdvanceOverlay => "advance overlay",
            BoothCommand::Capture => "take picture",
            BoothCommand::NewPicture => "new picture",
            BoothCommand::PostPicture => "post picture",
            BoothCommand::Shutdown => "shutdown",
        }
    }
}
