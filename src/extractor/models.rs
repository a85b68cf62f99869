//! Data structures for video information

use serde::{Deserialize, Serialize};

/// Title used when yt-dlp does not report one
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Video metadata as reported by yt-dlp, with absent fields already
/// replaced by placeholders where the response contract needs a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub uploader: String,
    pub duration_seconds: Option<f64>,
    pub view_count: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Container extension of the default download (e.g. "mp4")
    pub extension: Option<String>,
    /// Direct media URL, only filled by the fallback lookup
    pub direct_url: Option<String>,
    #[serde(default)]
    pub formats: Vec<MediaFormat>,
}

impl Default for VideoMetadata {
    fn default() -> Self {
        Self {
            title: UNKNOWN_TITLE.to_string(),
            uploader: crate::utils::UNKNOWN.to_string(),
            duration_seconds: None,
            view_count: None,
            thumbnail_url: None,
            extension: None,
            direct_url: None,
            formats: Vec::new(),
        }
    }
}

/// One encoded variant of a video
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaFormat {
    pub format_id: Option<String>,
    pub url: String,
    pub extension: String,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub height: Option<u32>,
    pub filesize: Option<u64>,
}

impl MediaFormat {
    pub fn has_video(&self) -> bool {
        self.video_codec.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio_codec.is_some()
    }

    /// Video and audio in a single stream
    pub fn is_muxed(&self) -> bool {
        self.has_video() && self.has_audio()
    }

    /// "720p" style label, or "Standard" when the height is unknown
    pub fn quality_label(&self) -> String {
        match self.height {
            Some(h) if h > 0 => format!("{}p", h),
            _ => "Standard".to_string(),
        }
    }
}

/// Record printed by `yt-dlp --dump-single-json`. Only the fields we read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVideoRecord {
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub channel: Option<String>,
    pub duration: Option<f64>,
    pub view_count: Option<u64>,
    pub thumbnail: Option<String>,
    pub ext: Option<String>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

/// Entry of the `formats` array in a yt-dlp JSON record
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFormat {
    pub format_id: Option<String>,
    pub url: Option<String>,
    pub ext: Option<String>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub height: Option<u32>,
    pub filesize: Option<u64>,
    pub filesize_approx: Option<u64>,
}
