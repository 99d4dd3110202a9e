use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::tracker::TrackerId;

// Story ids are at least 9 digits, long enough not to collide with
// version numbers or dates in branch names.
static TRACKER_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{9,}").expect("tracker id pattern is valid"));

/// Returns the leftmost run of 9 or more digits in `branch`.
pub fn extract_tracker_id(branch: &str) -> Option<TrackerId> {
    let found = TRACKER_ID_PATTERN.find(branch)?;
    debug!("Branch {} carries tracker ID {}", branch, found.as_str());
    TrackerId::new(found.as_str())
}
