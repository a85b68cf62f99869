//! Human readable formatting for durations and byte counts

/// Placeholder used wherever yt-dlp did not report a value.
pub const UNKNOWN: &str = "Unknown";

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Format a duration in seconds as `m:ss`.
///
/// Fractional seconds are floored. Minutes are not folded into hours, so an
/// hour-long video reads `60:00`. Absent or negative durations are `Unknown`.
pub fn format_duration(seconds: Option<f64>) -> String {
    match seconds {
        Some(secs) if secs.is_finite() && secs >= 0.0 => {
            let total = secs.floor() as u64;
            format!("{}:{:02}", total / 60, total % 60)
        }
        _ => UNKNOWN.to_string(),
    }
}

/// Format a byte count with binary units (1 KB = 1024 Bytes).
///
/// At most two decimals are kept and trailing zeros are dropped, so 1024 is
/// `1 KB` and 1536 is `1.5 KB`. Anything past gigabytes stays in GB.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

/// Like [`format_file_size`] but for sizes yt-dlp may not know.
pub fn format_optional_size(bytes: Option<u64>) -> String {
    match bytes {
        Some(b) => format_file_size(b),
        None => "Unknown size".to_string(),
    }
}
