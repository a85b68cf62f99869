//! Parsing of yt-dlp output
//!
//! Each invocation mode produces a known output shape. The caller tags the raw
//! text with the mode it used and [`parse_output`] dispatches on that tag; the
//! text itself is never sniffed to guess its shape.

use crate::extractor::models::{MediaFormat, RawFormat, RawVideoRecord, VideoMetadata, UNKNOWN_TITLE};
use crate::utils::error::{Result, SocialSaveError};
use crate::utils::{is_valid_url, UNKNOWN};

/// Separator between fields of the print template. Chosen to never appear in
/// titles or URLs.
pub const FIELD_SEPARATOR: &str = "|||";

/// Print template matching the positional layout read by the delimited parser
pub const FIELD_TEMPLATE: &str =
    "%(title)s|||%(duration)s|||%(uploader)s|||%(view_count)s|||%(thumbnail)s|||%(ext)s";

/// Raw stdout tagged with the invocation mode that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    /// One line of [`FIELD_TEMPLATE`] output
    Delimited(String),
    /// A full JSON record from `--dump-single-json`
    Structured(String),
    /// `--print title --print urls --print duration`: title, URLs, duration
    UrlListing(String),
}

/// Turn tool output into a [`VideoMetadata`].
pub fn parse_output(output: ToolOutput) -> Result<VideoMetadata> {
    match output {
        ToolOutput::Delimited(raw) => parse_delimited(&raw),
        ToolOutput::Structured(raw) => parse_structured(&raw),
        ToolOutput::UrlListing(raw) => parse_url_listing(&raw),
    }
}

fn parse_delimited(raw: &str) -> Result<VideoMetadata> {
    let line = raw
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| SocialSaveError::ParseError("empty field output".to_string()))?;

    let mut fields = line.split(FIELD_SEPARATOR).map(present);
    let title = fields.next().flatten();
    let duration = fields.next().flatten();
    let uploader = fields.next().flatten();
    let view_count = fields.next().flatten();
    let thumbnail = fields.next().flatten();
    let ext = fields.next().flatten();

    Ok(VideoMetadata {
        title: title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        uploader: uploader.unwrap_or_else(|| UNKNOWN.to_string()),
        duration_seconds: duration.as_deref().and_then(parse_seconds),
        view_count,
        thumbnail_url: thumbnail,
        extension: ext,
        direct_url: None,
        formats: Vec::new(),
    })
}

fn parse_structured(raw: &str) -> Result<VideoMetadata> {
    let record: RawVideoRecord = serde_json::from_str(raw.trim())
        .map_err(|e| SocialSaveError::ParseError(format!("invalid JSON record: {}", e)))?;

    let uploader = record
        .uploader
        .and_then(|u| present(&u))
        .or_else(|| record.channel.and_then(|c| present(&c)))
        .unwrap_or_else(|| UNKNOWN.to_string());

    Ok(VideoMetadata {
        title: record
            .title
            .and_then(|t| present(&t))
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        uploader,
        duration_seconds: record.duration.filter(|d| d.is_finite() && *d >= 0.0),
        view_count: record.view_count.map(|v| v.to_string()),
        thumbnail_url: record.thumbnail.and_then(|t| present(&t)),
        extension: record.ext.and_then(|e| present(&e)),
        direct_url: None,
        formats: record.formats.into_iter().map(convert_format).collect(),
    })
}

fn parse_url_listing(raw: &str) -> Result<VideoMetadata> {
    let lines: Vec<&str> = raw.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.len() < 2 {
        return Err(SocialSaveError::ParseError(format!(
            "expected title and duration lines, got {}",
            lines.len()
        )));
    }

    let title = present(lines[0]).unwrap_or_else(|| UNKNOWN_TITLE.to_string());
    let duration = lines[lines.len() - 1];
    let direct_url = lines[1..lines.len() - 1]
        .iter()
        .find(|l| is_valid_url(l))
        .map(|l| l.to_string());

    Ok(VideoMetadata {
        title,
        duration_seconds: parse_seconds(duration),
        direct_url,
        ..VideoMetadata::default()
    })
}

fn convert_format(raw: RawFormat) -> MediaFormat {
    MediaFormat {
        format_id: raw.format_id,
        url: raw.url.unwrap_or_default(),
        extension: raw.ext.unwrap_or_default(),
        video_codec: raw.vcodec.and_then(|c| codec(&c)),
        audio_codec: raw.acodec.and_then(|c| codec(&c)),
        height: raw.height,
        filesize: raw.filesize.or(raw.filesize_approx),
    }
}

/// yt-dlp prints `NA` for fields a site does not provide.
fn present(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "NA" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// yt-dlp reports a missing stream as the codec "none".
fn codec(value: &str) -> Option<String> {
    present(value).filter(|c| !c.eq_ignore_ascii_case("none"))
}

fn parse_seconds(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
}
