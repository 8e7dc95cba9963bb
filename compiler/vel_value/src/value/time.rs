//! Duration and timestamp helpers.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

use crate::errors::{out_of_range, Result};

/// Largest duration magnitude accepted, in seconds (10000 years).
pub const MAX_DURATION_SECONDS: i64 = 315_576_000_000;

/// Build a duration from protobuf-style seconds and nanos.
pub fn duration_from_parts(seconds: i64, nanos: i32) -> Result<TimeDelta> {
    if seconds.abs() > MAX_DURATION_SECONDS {
        return Err(out_of_range("duration out of range"));
    }
    TimeDelta::try_seconds(seconds)
        .and_then(|whole| whole.checked_add(&TimeDelta::nanoseconds(i64::from(nanos))))
        .ok_or_else(|| out_of_range("duration out of range"))
}

/// Split a duration into protobuf-style seconds and nanos with matching signs.
pub fn duration_to_parts(duration: TimeDelta) -> (i64, i32) {
    (duration.num_seconds(), duration.subsec_nanos())
}

/// Build a timestamp from seconds and nanos since the Unix epoch.
pub fn timestamp_from_parts(seconds: i64, nanos: i32) -> Result<DateTime<Utc>> {
    let nanos = u32::try_from(nanos).map_err(|_| out_of_range("timestamp nanos out of range"))?;
    DateTime::from_timestamp(seconds, nanos).ok_or_else(|| out_of_range("timestamp out of range"))
}

pub fn timestamp_to_parts(timestamp: DateTime<Utc>) -> (i64, i32) {
    let nanos = i32::try_from(timestamp.timestamp_subsec_nanos()).unwrap_or(0);
    (timestamp.timestamp(), nanos)
}

/// `1.5s`, `-2s`, `0s`.
pub fn format_duration(duration: TimeDelta) -> String {
    let (seconds, nanos) = duration_to_parts(duration);
    if nanos == 0 {
        return format!("{seconds}s");
    }
    let sign = if seconds < 0 || nanos < 0 { "-" } else { "" };
    let fraction = format!("{:09}", nanos.unsigned_abs());
    format!(
        "{sign}{}.{}s",
        seconds.unsigned_abs(),
        fraction.trim_end_matches('0')
    )
}

/// RFC 3339 in UTC with a `Z` suffix.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
