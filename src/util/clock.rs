//! Wall-clock helpers.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::util::serde::TimeMs;

/// Milliseconds since the Unix epoch, saturating on clock skew.
#[must_use]
pub fn now_ms() -> TimeMs {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, duration_to_ms)
}

/// Convert a duration to whole milliseconds, saturating at `TimeMs::MAX`.
#[must_use]
pub fn duration_to_ms(d: Duration) -> TimeMs {
    TimeMs::try_from(d.as_millis()).unwrap_or(TimeMs::MAX)
}
