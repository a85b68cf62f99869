//! Request and response bodies of the JSON API
//!
//! Field names are camelCase on the wire. No response field is ever `null`:
//! absent metadata is replaced by a placeholder before serialisation.

use serde::{Deserialize, Serialize};

use crate::downloader::DownloadedArtifact;
use crate::extractor::{MediaFormat, VideoMetadata};
use crate::utils::{format_duration, format_file_size, format_optional_size, Platform, UNKNOWN};

/// Body accepted by every POST endpoint
#[derive(Debug, Default, Deserialize)]
pub struct VideoRequest {
    #[serde(default)]
    pub url: Option<String>,
    /// yt-dlp format selector, passed through verbatim
    #[serde(default)]
    pub quality: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DirectDownloadQuery {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub success: bool,
    pub platform: Platform,
    pub video_info: VideoInfo,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub title: String,
    pub duration: String,
    pub uploader: String,
    pub view_count: String,
    pub thumbnail: String,
}

impl VideoInfo {
    pub fn from_metadata(meta: &VideoMetadata) -> Self {
        Self {
            title: meta.title.clone(),
            duration: format_duration(meta.duration_seconds),
            uploader: meta.uploader.clone(),
            view_count: meta.view_count.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            thumbnail: meta.thumbnail_url.clone().unwrap_or_default(),
        }
    }

    /// Answer given when yt-dlp cannot describe the video.
    pub fn placeholder(platform: Platform) -> Self {
        Self {
            title: format!("{} Video Ready", platform.display_name()),
            duration: UNKNOWN.to_string(),
            uploader: "SocialSave".to_string(),
            view_count: UNKNOWN.to_string(),
            thumbnail: String::new(),
        }
    }
}

/// Metadata fetched ahead of a download
#[derive(Debug, Clone, Serialize)]
pub struct DownloadSummary {
    pub title: String,
    pub duration: String,
    pub uploader: String,
    pub extension: String,
}

impl DownloadSummary {
    pub fn from_metadata(meta: &VideoMetadata) -> Self {
        Self {
            title: meta.title.clone(),
            duration: format_duration(meta.duration_seconds),
            uploader: meta.uploader.clone(),
            extension: meta.extension.clone().unwrap_or_else(|| "mp4".to_string()),
        }
    }

    pub fn fallback() -> Self {
        Self {
            title: "Video".to_string(),
            duration: UNKNOWN.to_string(),
            uploader: UNKNOWN.to_string(),
            extension: "mp4".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub success: bool,
    pub video_info: DownloadedVideoInfo,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadedVideoInfo {
    #[serde(flatten)]
    pub summary: DownloadSummary,
    pub filename: String,
    pub file_size: String,
    pub download_url: String,
    pub full_path: String,
}

impl DownloadResponse {
    pub fn new(summary: DownloadSummary, artifact: &DownloadedArtifact) -> Self {
        Self {
            success: true,
            video_info: DownloadedVideoInfo {
                summary,
                filename: artifact.display_filename.clone(),
                file_size: format_file_size(artifact.size_bytes),
                download_url: artifact.served_path.clone(),
                full_path: artifact.served_path.clone(),
            },
            message: "Video downloaded successfully!",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioResponse {
    pub success: bool,
    pub audio_info: AudioInfo,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioInfo {
    pub filename: String,
    pub file_size: String,
    pub download_url: String,
    pub format: &'static str,
}

impl AudioResponse {
    pub fn new(artifact: &DownloadedArtifact) -> Self {
        Self {
            success: true,
            audio_info: AudioInfo {
                filename: artifact.display_filename.clone(),
                file_size: format_file_size(artifact.size_bytes),
                download_url: artifact.served_path.clone(),
                format: "MP3",
            },
            message: "Audio downloaded successfully!",
        }
    }
}

/// Direct media link for a video, without storing anything locally
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub success: bool,
    pub platform: Platform,
    pub title: String,
    pub author: String,
    pub duration: String,
    pub thumbnail: String,
    pub download_url: String,
    pub filesize: String,
    pub quality: String,
    pub direct_download: bool,
}

impl ResolveResponse {
    /// From the full record and the format chosen by the selector.
    pub fn from_format(platform: Platform, meta: &VideoMetadata, best: &MediaFormat) -> Self {
        Self {
            success: true,
            platform,
            title: meta.title.clone(),
            author: meta.uploader.clone(),
            duration: format_duration(meta.duration_seconds),
            thumbnail: meta.thumbnail_url.clone().unwrap_or_default(),
            download_url: best.url.clone(),
            filesize: format_optional_size(best.filesize),
            quality: best.quality_label(),
            direct_download: true,
        }
    }

    /// From the reduced fallback lookup. Without a reported media URL the
    /// page URL itself is handed back.
    pub fn from_basic(platform: Platform, page_url: &str, meta: &VideoMetadata) -> Self {
        Self {
            success: true,
            platform,
            title: meta.title.clone(),
            author: UNKNOWN.to_string(),
            duration: format_duration(meta.duration_seconds),
            thumbnail: String::new(),
            download_url: meta
                .direct_url
                .clone()
                .unwrap_or_else(|| page_url.to_string()),
            filesize: format_optional_size(None),
            quality: "Standard".to_string(),
            direct_download: true,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: String,
    pub platforms: Vec<Platform>,
}
