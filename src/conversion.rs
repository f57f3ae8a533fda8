//! Internal utility functions.
//!
//! Timestamp arithmetic and string helpers shared by the metadata cache,
//! the seek controller and the packet iterator.

use std::time::Duration;

use ffmpeg_next::{Rational, Rescale, rescale::TIME_BASE};

/// Convert a rational to `f64`, returning `0.0` for a zero denominator.
pub fn rational_to_f64(value: Rational) -> f64 {
    if value.denominator() == 0 {
        0.0
    } else {
        value.numerator() as f64 / value.denominator() as f64
    }
}

/// Round to two decimal places.
pub fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rescale a PTS value from stream time base to seconds.
pub fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator().max(1) as f64
}

/// Convert a PTS to a [`Duration`], clamping negative values to zero.
pub fn pts_to_duration(pts: i64, time_base: Rational) -> Duration {
    Duration::from_secs_f64(pts_to_seconds(pts, time_base).max(0.0))
}

/// Convert whole seconds into a timestamp in `time_base`.
///
/// Goes through `AV_TIME_BASE` (microseconds) exactly as the engine's own
/// rescaling does.
pub fn seconds_to_stream_timestamp(seconds: i64, time_base: Rational) -> i64 {
    seconds.saturating_mul(1_000_000).rescale(TIME_BASE, time_base)
}

/// Rescale a container duration (microseconds) into `time_base`.
pub fn container_duration_to_stream(duration: i64, time_base: Rational) -> i64 {
    duration.rescale(TIME_BASE, time_base)
}

/// `duration × percent / 100`, computed without intermediate overflow.
pub fn percentage_of(duration: i64, percent: i32) -> i64 {
    let target = i128::from(duration) * i128::from(percent) / 100;
    target.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

/// Longest prefix of `value` that fits in `max_bytes` without splitting a
/// UTF-8 sequence.
pub fn truncate_utf8(value: &str, max_bytes: usize) -> &str {
    if value.len() <= max_bytes {
        return value;
    }
    let mut end = max_bytes;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}
