/// Millisecond-epoch timestamp normalization
use chrono::{DateTime, Datelike, Timelike, Utc};

/// Normalize a stored date value.
///
/// `None` (not an integer) and zero both mean "no timestamp" and yield an
/// empty string. Anything else is rendered by [`format_epoch_millis`].
pub fn normalize_timestamp(value: Option<i64>) -> String {
    match value {
        None | Some(0) => String::new(),
        Some(millis) => format_epoch_millis(millis),
    }
}

/// Render milliseconds since the Unix epoch as ISO-8601 UTC.
///
/// Whole seconds render as `2023-11-14T22:13:20+00:00`, anything finer adds
/// six fractional digits. Instants outside years 1..=9999 fall back to the
/// raw integer in decimal.
pub fn format_epoch_millis(millis: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(millis) {
        Some(dt) if (1..=9999).contains(&dt.year()) => {
            let pattern = if dt.nanosecond() == 0 {
                "%Y-%m-%dT%H:%M:%S+00:00"
            } else {
                "%Y-%m-%dT%H:%M:%S%.6f+00:00"
            };
            dt.format(pattern).to_string()
        }
        _ => millis.to_string(),
    }
}
