//! Conversions from raw engine time values.
//!
//! Engines report time as `f64` seconds and use NaN or infinity for "not known
//! yet" and "unbounded" (live). These helpers filter those out before anything
//! reaches callers.

use bridge_traits::TimeRange;
use std::time::Duration;

/// Seconds to `Duration`, or `None` when the value is NaN, infinite or negative.
pub fn duration_from_secs(seconds: f64) -> Option<Duration> {
    if seconds.is_finite() && seconds >= 0.0 {
        Duration::try_from_secs_f64(seconds).ok()
    } else {
        None
    }
}

/// Playback position, clamped to zero for garbage values.
pub fn position_from_secs(seconds: f64) -> Duration {
    duration_from_secs(seconds).unwrap_or(Duration::ZERO)
}

/// `current / duration`, or `0.0` when the duration is unknown or not positive.
pub fn progress(current: Duration, duration: Option<Duration>) -> f64 {
    match duration {
        Some(total) if !total.is_zero() => current.as_secs_f64() / total.as_secs_f64(),
        _ => 0.0,
    }
}

/// Furthest loaded point across `ranges`.
pub fn buffered_until(ranges: &[TimeRange]) -> Option<Duration> {
    ranges
        .iter()
        .filter_map(|range| duration_from_secs(range.end()))
        .max()
}
