//! Timestamp helpers for fuel-expiry and unanchor comparisons.
//!
//! ESI reports timestamps as RFC 3339 strings in UTC (`2024-01-15T11:05:00Z`).
//! Everything in the domain model is a `DateTime<Utc>`.

use chrono::{DateTime, Duration, Utc};

use crate::error::{Error, Result};

/// Parse an ESI timestamp.
///
/// # Errors
/// [`Error::InvalidTimestamp`] when the value is not RFC 3339.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| Error::InvalidTimestamp {
            value: value.to_string(),
            message: err.to_string(),
        })
}

/// Time left from `now` until `until`; negative once `until` has passed.
pub fn remaining(until: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    until.signed_duration_since(now)
}

/// Render a remaining duration for humans, e.g. `2d 4h` or `5h 12m`.
pub fn format_remaining(duration: Duration) -> String {
    if duration <= Duration::zero() {
        return "expired".to_string();
    }

    let days = duration.num_days();
    let hours = duration.num_hours() % 24;
    let minutes = duration.num_minutes() % 60;

    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{}m", minutes.max(1))
    }
}
