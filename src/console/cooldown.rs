use chrono::{DateTime, Utc};
use std::time::Duration;

/// True once more than `min` has elapsed between the two timestamps.
/// Argument order does not matter; an exact `min` difference is still
/// inside the cooldown window.
pub fn slowdown_over(a: DateTime<Utc>, b: DateTime<Utc>, min: Duration) -> bool {
    let elapsed = (a - b).abs();
    elapsed.num_milliseconds() > min.as_millis() as i64
}
