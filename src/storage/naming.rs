//! Capture file naming
//!
//! Captures are named `image-<day>-<month> <hour>:<minute>.<ext>` in UTC.
//! Two captures in the same minute share a name and the later one wins,
//! unless `unique_names` adds a seconds field.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

const MINUTE_PATTERN: &str = "image-%d-%m %H:%M";
const SECOND_PATTERN: &str = "image-%d-%m %H:%M:%S";

/// Build the output path for a capture taken at `at`
pub fn capture_path(images_dir: &Path, extension: &str, unique: bool, at: DateTime<Utc>) -> PathBuf {
    let pattern = if unique { SECOND_PATTERN } else { MINUTE_PATTERN };
    let stem = at.format(pattern).to_string();
    images_dir.join(format!("{}.{}", stem, extension))
}
