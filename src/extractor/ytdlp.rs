//! yt-dlp wrapper for metadata lookups, URL resolution and downloads
//!
//! Builds the command line for each operation and hands it to a
//! [`ToolRunner`]. Supports an explicitly configured binary, one shipped next
//! to our executable, or a system-installed yt-dlp.

use crate::extractor::invoker::{Invocation, RunLimits, ToolRunner};
use crate::extractor::models::VideoMetadata;
use crate::extractor::parser::{parse_output, ToolOutput, FIELD_TEMPLATE};
use crate::utils::config::ToolTimeouts;
use crate::utils::error::{Result, SocialSaveError};
use crate::utils::is_valid_url;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How the media should be materialised
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaMode {
    /// Video with a yt-dlp format selector passed through verbatim
    Video { format: String },
    /// Best audio stream, transcoded to MP3
    AudioMp3,
}

/// Video extractor backed by yt-dlp
pub struct YtDlpExtractor {
    runner: Arc<dyn ToolRunner>,
    timeouts: ToolTimeouts,
    max_output_bytes: usize,
}

impl YtDlpExtractor {
    pub fn new(runner: Arc<dyn ToolRunner>, timeouts: ToolTimeouts, max_output_bytes: usize) -> Self {
        Self {
            runner,
            timeouts,
            max_output_bytes,
        }
    }

    fn limits(&self, operation: &'static str, secs: u64) -> RunLimits {
        RunLimits {
            operation,
            timeout: Duration::from_secs(secs),
            max_output_bytes: self.max_output_bytes,
        }
    }

    /// Common flags for every invocation against a target URL
    fn base() -> Invocation {
        Invocation::new().flag("--no-warnings").flag("--no-playlist")
    }

    /// Lightweight metadata lookup using the delimited print template.
    /// Uses: yt-dlp --print "<template>"
    pub async fn fetch_info(&self, url: &str) -> Result<VideoMetadata> {
        ensure_valid(url)?;
        debug!("Fetching info for URL: {}", url);

        let invocation = Self::base()
            .flag("--skip-download")
            .option("--print", FIELD_TEMPLATE)
            .target(url);
        let stdout = self
            .runner
            .run(&invocation, self.limits("metadata lookup", self.timeouts.info_secs))
            .await?;

        parse_output(ToolOutput::Delimited(stdout))
    }

    /// Full JSON record including every available format.
    /// Uses: yt-dlp --dump-single-json
    pub async fn fetch_record(&self, url: &str) -> Result<VideoMetadata> {
        ensure_valid(url)?;
        debug!("Fetching JSON record for URL: {}", url);

        let invocation = Self::base()
            .flag("--skip-download")
            .flag("--dump-single-json")
            .target(url);
        let stdout = self
            .runner
            .run(&invocation, self.limits("record lookup", self.timeouts.record_secs))
            .await?;

        parse_output(ToolOutput::Structured(stdout))
    }

    /// Reduced lookup used when the full record cannot be fetched: asks only
    /// for the title, the media URLs and the duration.
    pub async fn fetch_basic(&self, url: &str) -> Result<VideoMetadata> {
        ensure_valid(url)?;
        debug!("Fetching basic info for URL: {}", url);

        let invocation = Self::base()
            .flag("--skip-download")
            .option("--print", "title")
            .option("--print", "urls")
            .option("--print", "duration")
            .target(url);
        let stdout = self
            .runner
            .run(&invocation, self.limits("basic lookup", self.timeouts.fallback_secs))
            .await?;

        parse_output(ToolOutput::UrlListing(stdout))
    }

    /// Resolve the direct media URL for the default format.
    /// Uses: yt-dlp --get-url
    pub async fn resolve_direct_url(&self, url: &str) -> Result<String> {
        ensure_valid(url)?;
        debug!("Resolving direct URL for: {}", url);

        let invocation = Self::base().flag("--get-url").target(url);
        let stdout = self
            .runner
            .run(
                &invocation,
                self.limits("direct URL lookup", self.timeouts.direct_url_secs),
            )
            .await?;

        let direct = stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .ok_or_else(|| SocialSaveError::ToolFailure("yt-dlp returned no URL".to_string()))?;

        if !is_valid_url(direct) {
            warn!("yt-dlp returned an unusable URL: {}", direct);
            return Err(SocialSaveError::ToolFailure(
                "yt-dlp returned an invalid URL".to_string(),
            ));
        }
        Ok(direct.to_string())
    }

    /// Materialise media to `output_template` (a yt-dlp `-o` template).
    pub async fn download_media(&self, url: &str, output_template: &Path, mode: &MediaMode) -> Result<()> {
        ensure_valid(url)?;

        let invocation = match mode {
            MediaMode::Video { format } => Self::base().option("-f", format.as_str()),
            MediaMode::AudioMp3 => Self::base()
                .option("-f", "bestaudio")
                .flag("--extract-audio")
                .option("--audio-format", "mp3"),
        }
        .flag("--no-progress")
        .flag("--no-part")
        .flag("--no-mtime")
        .path_option("-o", output_template)
        .target(url);

        info!("Starting {:?} download for: {}", mode, url);
        self.runner
            .run(&invocation, self.limits("download", self.timeouts.download_secs))
            .await?;
        info!("yt-dlp reported download complete for: {}", url);
        Ok(())
    }

    pub fn runner_id(&self) -> &str {
        self.runner.id()
    }
}

/// Last line of defence: nothing that is not a valid URL reaches the tool.
fn ensure_valid(url: &str) -> Result<()> {
    if is_valid_url(url) {
        Ok(())
    } else {
        Err(SocialSaveError::InvalidUrl(url.to_string()))
    }
}

// ============================================================
// yt-dlp Detection Functions
// ============================================================

/// Find yt-dlp binary with priority:
/// 1. Next to our executable
/// 2. System PATH
/// 3. Common installation paths
pub fn find_ytdlp() -> Option<PathBuf> {
    if let Some(bundled) = find_bundled_ytdlp() {
        info!("✓ Using bundled yt-dlp: {:?}", bundled);
        return Some(bundled);
    }

    if let Ok(system) = which::which("yt-dlp") {
        info!("✓ Using system yt-dlp: {:?}", system);
        return Some(system);
    }

    if let Some(common) = find_in_common_paths() {
        info!("✓ Using yt-dlp from common path: {:?}", common);
        return Some(common);
    }

    warn!("✗ yt-dlp not found anywhere!");
    None
}

/// yt-dlp shipped alongside the server binary (container images, releases)
fn find_bundled_ytdlp() -> Option<PathBuf> {
    let exe_path = std::env::current_exe().ok()?;
    let exe_dir = exe_path.parent()?;

    let binary_name = if cfg!(target_os = "windows") {
        "yt-dlp.exe"
    } else {
        "yt-dlp"
    };
    let candidate = exe_dir.join(binary_name);
    if candidate.is_file() && is_executable(&candidate) {
        return Some(candidate);
    }
    None
}

fn find_in_common_paths() -> Option<PathBuf> {
    let common_paths = [
        // Homebrew (Apple Silicon)
        "/opt/homebrew/bin/yt-dlp",
        // Homebrew (Intel) / manual installs
        "/usr/local/bin/yt-dlp",
        // Distribution packages
        "/usr/bin/yt-dlp",
        // pip --user
        "~/.local/bin/yt-dlp",
    ];

    common_paths
        .iter()
        .map(|p| expand_home(p))
        .find(|p| p.is_file() && is_executable(p))
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

/// Check if a file is executable
fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        std::fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        path.exists()
    }
}
