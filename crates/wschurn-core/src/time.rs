//! Wall-clock timestamps.

use chrono::{DateTime, Local};

/// Format used for heartbeat payloads and log timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f %z";

/// Current local time rendered with [`TIMESTAMP_FORMAT`].
pub fn now_timestamp() -> String {
    format_timestamp(&Local::now())
}

/// Render a timestamp with [`TIMESTAMP_FORMAT`].
pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}
