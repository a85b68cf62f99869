//! Download orchestration
//!
//! Drives yt-dlp to write a media file, verifies on disk that the file
//! actually exists, publishes it into the downloads directory and describes
//! it for the HTTP layer.
//!
//! yt-dlp writes into a staging directory. Only after it exits successfully
//! is the file renamed into the public downloads directory, so readers of that
//! directory (the static file route, the sweeper) never see a half-written
//! artifact.

use crate::downloader::{PUBLIC_PREFIX, STAGING_DIR_NAME};
use crate::extractor::{MediaMode, YtDlpExtractor};
use crate::utils::error::{Result, SocialSaveError};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, info, warn};

/// Random bytes in an artifact identifier (hex encoded to twice the length)
const FILE_ID_BYTES: usize = 8;

/// Suffixes yt-dlp uses for scratch files that are never the final artifact
const SCRATCH_SUFFIXES: [&str; 3] = [".part", ".ytdl", ".temp"];

/// A media file persisted in the downloads directory
#[derive(Debug, Clone, Serialize)]
pub struct DownloadedArtifact {
    /// Random identifier, also the on-disk filename prefix
    pub file_id: String,
    /// Filename without the identifier prefix
    pub display_filename: String,
    /// Filename on disk
    pub file_name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    /// URL path the artifact is served from
    pub served_path: String,
    pub created_at: DateTime<Utc>,
}

/// Downloads media to local disk through yt-dlp
pub struct DownloadOrchestrator {
    extractor: Arc<YtDlpExtractor>,
    downloads_dir: PathBuf,
    staging_dir: PathBuf,
    default_quality: String,
}

impl DownloadOrchestrator {
    pub fn new(
        extractor: Arc<YtDlpExtractor>,
        downloads_dir: PathBuf,
        default_quality: impl Into<String>,
    ) -> Self {
        let staging_dir = downloads_dir.join(STAGING_DIR_NAME);
        Self {
            extractor,
            downloads_dir,
            staging_dir,
            default_quality: default_quality.into(),
        }
    }

    pub fn downloads_dir(&self) -> &Path {
        &self.downloads_dir
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Create the downloads and staging directories if missing.
    pub async fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.staging_dir).await?;
        debug!("Downloads directory ready: {:?}", self.downloads_dir);
        Ok(())
    }

    /// Download a video. `quality` is a yt-dlp format selector passed through
    /// verbatim; the configured default applies when it is absent.
    pub async fn download(&self, url: &str, quality: Option<&str>) -> Result<DownloadedArtifact> {
        let format = quality
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(&self.default_quality)
            .to_string();
        self.materialize(url, MediaMode::Video { format }).await
    }

    /// Download the audio track only, transcoded to MP3.
    pub async fn download_audio(&self, url: &str) -> Result<DownloadedArtifact> {
        self.materialize(url, MediaMode::AudioMp3).await
    }

    async fn materialize(&self, url: &str, mode: MediaMode) -> Result<DownloadedArtifact> {
        self.prepare().await?;

        let file_id = generate_file_id();
        let template = self.staging_dir.join(format!("{}_%(title)s.%(ext)s", file_id));

        self.extractor.download_media(url, &template, &mode).await?;

        // yt-dlp's exit status alone is not trusted; the file has to be there.
        let staged = locate_artifact(&self.staging_dir, &file_id).await?;
        let file_name = staged
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| SocialSaveError::ArtifactNotFound(file_id.clone()))?;

        // Retention is measured from publication. A yt-dlp config with
        // --mtime would otherwise stamp the upload date on the file.
        touch(&staged).await?;

        let published = self.downloads_dir.join(&file_name);
        fs::rename(&staged, &published).await?;
        let size_bytes = fs::metadata(&published).await?.len();

        let display_filename = file_name
            .strip_prefix(&format!("{}_", file_id))
            .unwrap_or(&file_name)
            .to_string();

        info!(
            "Artifact {} ready: {} ({} bytes)",
            file_id, display_filename, size_bytes
        );

        Ok(DownloadedArtifact {
            served_path: served_path(&file_name),
            file_id,
            display_filename,
            file_name,
            path: published,
            size_bytes,
            created_at: Utc::now(),
        })
    }
}

/// 8 bytes from the OS CSPRNG, hex encoded.
pub fn generate_file_id() -> String {
    let mut bytes = [0u8; FILE_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Set a file's modification time to now.
async fn touch(path: &Path) -> Result<()> {
    let file = fs::OpenOptions::new().write(true).open(path).await?;
    file.into_std().await.set_modified(SystemTime::now())?;
    Ok(())
}

/// Public URL path for a file in the downloads directory
pub fn served_path(file_name: &str) -> String {
    format!("{}/{}", PUBLIC_PREFIX, urlencoding::encode(file_name))
}

/// Find the file yt-dlp produced for `file_id` in `dir`.
///
/// Scratch files are ignored. If several candidates remain (e.g. a leftover
/// intermediate stream), the largest one is taken.
pub async fn locate_artifact(dir: &Path, file_id: &str) -> Result<PathBuf> {
    let prefix = format!("{}_", file_id);
    let mut entries = fs::read_dir(dir).await?;
    let mut candidates: Vec<(PathBuf, u64)> = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(&prefix) || SCRATCH_SUFFIXES.iter().any(|s| name.ends_with(s)) {
            continue;
        }
        let metadata = entry.metadata().await?;
        if metadata.is_file() {
            candidates.push((entry.path(), metadata.len()));
        }
    }

    if candidates.len() > 1 {
        warn!(
            "{} files match artifact {}, keeping the largest",
            candidates.len(),
            file_id
        );
    }

    candidates
        .into_iter()
        .max_by_key(|(_, len)| *len)
        .map(|(path, _)| path)
        .ok_or_else(|| SocialSaveError::ArtifactNotFound(file_id.to_string()))
}
