//! Runtime status of the booth, refreshed after every command

use std::path::PathBuf;

/// Runtime state that is not persisted
#[derive(Debug, Clone, Default)]
pub struct RuntimeState {
    /// Whether the live preview is running
    pub previewing: bool,
    /// Index of the selected overlay
    pub overlay_index: usize,
    /// Number of loaded overlays
    pub overlay_count: usize,
    /// Most recent capture
    pub last_output: Option<PathBuf>,
    /// Bumped whenever the thumbnail file is rewritten
    pub thumbnail_generation: u64,
    /// Last error message (if any)
    pub last_error: Option<String>,
    /// Posts created since startup
    pub posts_sent: usize,
    /// Id of the most recent post
    pub last_post_id: Option<String>,
}

impl RuntimeState {
    /// Clear any error state
    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Set an error message
    pub fn set_error(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
    }
}
