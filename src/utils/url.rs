//! URL validation performed before anything is handed to yt-dlp

use url::Url;

/// Returns true when `input` is an absolute http(s) URL with a non-empty host.
///
/// No network access is performed.
pub fn is_valid_url(input: &str) -> bool {
    parse_url(input).is_some()
}

/// Parses `input` and returns the URL only if it passes [`is_valid_url`].
pub fn parse_url(input: &str) -> Option<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed != input {
        return None;
    }

    let parsed = Url::parse(trimmed).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Some(parsed),
        _ => None,
    }
}
