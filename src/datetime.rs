//! Date/time utilities for relay-chat.
//!
//! Wire timestamps are milliseconds since the Unix epoch, the same shape a
//! browser produces with `Date.now()`.

use chrono::{DateTime, Local, TimeZone, Utc};

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Current time as a wire timestamp.
pub fn now_millis() -> Timestamp {
    Utc::now().timestamp_millis()
}

/// Convert a wire timestamp to a UTC datetime.
///
/// Returns None if the value is outside chrono's representable range.
pub fn from_millis(ms: Timestamp) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// Format a wire timestamp in local time.
///
/// Falls back to the raw number if it cannot be represented.
pub fn format_millis(ms: Timestamp, format: &str) -> String {
    match from_millis(ms) {
        Some(dt) => dt.with_timezone(&Local).format(format).to_string(),
        None => ms.to_string(),
    }
}

/// Format a wire timestamp as a short clock time (HH:MM).
pub fn format_clock(ms: Timestamp) -> String {
    format_millis(ms, "%H:%M")
}
