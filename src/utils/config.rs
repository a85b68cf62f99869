//! Server configuration
//!
//! Resolved once at startup (defaults, then environment, then CLI flags) and
//! passed explicitly to the components that need it.

use crate::utils::error::{Result, SocialSaveError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Where downloaded artifacts are kept until swept
    pub downloads_dir: PathBuf,

    /// Explicit yt-dlp binary. Discovered automatically when unset.
    pub ytdlp_path: Option<PathBuf>,

    /// yt-dlp format selector used when a request carries no quality
    pub default_quality: String,

    /// Artifacts older than this are deleted by the sweeper
    pub retention_secs: u64,

    /// How often the sweeper runs
    pub sweep_interval_secs: u64,

    /// Per-operation time budgets for yt-dlp
    pub timeouts: ToolTimeouts,

    /// Upper bound on captured yt-dlp output (bytes, per stream)
    pub max_output_bytes: usize,
}

/// Time budgets for each kind of yt-dlp invocation (seconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolTimeouts {
    /// Delimited field lookup used by /api/info and the download pre-fetch
    pub info_secs: u64,
    /// Full JSON record dump
    pub record_secs: u64,
    /// Reduced fallback lookup
    pub fallback_secs: u64,
    /// Direct media URL resolution
    pub direct_url_secs: u64,
    /// Media materialisation
    pub download_secs: u64,
}

impl Default for ToolTimeouts {
    fn default() -> Self {
        Self {
            info_secs: 30,
            record_secs: 15,
            fallback_secs: 10,
            direct_url_secs: 10,
            download_secs: 300,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            downloads_dir: PathBuf::from("downloads"),
            ytdlp_path: None,
            default_quality: "best[height<=720]".to_string(),
            retention_secs: 2 * 60 * 60,
            sweep_interval_secs: 60 * 60,
            timeouts: ToolTimeouts::default(),
            max_output_bytes: 50 * 1024 * 1024, // 50MB
        }
    }
}

impl ServerSettings {
    /// Load settings from environment variables, falling back to defaults.
    ///
    /// | Env Var                   | Default              |
    /// |---------------------------|----------------------|
    /// | `HOST`                    | `0.0.0.0`            |
    /// | `PORT`                    | `3000`               |
    /// | `DOWNLOADS_DIR`           | `downloads`          |
    /// | `YTDLP_PATH`              | auto-discovered      |
    /// | `DEFAULT_QUALITY`         | `best[height<=720]`  |
    /// | `RETENTION_HOURS`         | `2`                  |
    /// | `SWEEP_INTERVAL_SECS`     | `3600`               |
    /// | `INFO_TIMEOUT_SECS`       | `30`                 |
    /// | `RECORD_TIMEOUT_SECS`     | `15`                 |
    /// | `FALLBACK_TIMEOUT_SECS`   | `10`                 |
    /// | `DIRECT_URL_TIMEOUT_SECS` | `10`                 |
    /// | `DOWNLOAD_TIMEOUT_SECS`   | `300`                |
    /// | `MAX_OUTPUT_BYTES`        | `52428800`           |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerSettings::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let timeouts = ToolTimeouts {
            info_secs: parse_var(&lookup, "INFO_TIMEOUT_SECS", defaults.timeouts.info_secs)?,
            record_secs: parse_var(&lookup, "RECORD_TIMEOUT_SECS", defaults.timeouts.record_secs)?,
            fallback_secs: parse_var(
                &lookup,
                "FALLBACK_TIMEOUT_SECS",
                defaults.timeouts.fallback_secs,
            )?,
            direct_url_secs: parse_var(
                &lookup,
                "DIRECT_URL_TIMEOUT_SECS",
                defaults.timeouts.direct_url_secs,
            )?,
            download_secs: parse_var(
                &lookup,
                "DOWNLOAD_TIMEOUT_SECS",
                defaults.timeouts.download_secs,
            )?,
        };

        let retention_hours: u64 =
            parse_var(&lookup, "RETENTION_HOURS", defaults.retention_secs / 3600)?;

        let settings = Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT", defaults.port)?,
            downloads_dir: lookup("DOWNLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.downloads_dir),
            ytdlp_path: lookup("YTDLP_PATH").map(PathBuf::from),
            default_quality: lookup("DEFAULT_QUALITY").unwrap_or(defaults.default_quality),
            retention_secs: retention_hours.saturating_mul(3600),
            sweep_interval_secs: parse_var(
                &lookup,
                "SWEEP_INTERVAL_SECS",
                defaults.sweep_interval_secs,
            )?,
            timeouts,
            max_output_bytes: parse_var(&lookup, "MAX_OUTPUT_BYTES", defaults.max_output_bytes)?,
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings that would make the service unusable.
    pub fn validate(&self) -> Result<()> {
        if self.sweep_interval_secs == 0 {
            return Err(SocialSaveError::Config(
                "SWEEP_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }
        if self.max_output_bytes == 0 {
            return Err(SocialSaveError::Config(
                "MAX_OUTPUT_BYTES must be greater than zero".to_string(),
            ));
        }
        if self.default_quality.trim().is_empty() {
            return Err(SocialSaveError::Config(
                "DEFAULT_QUALITY must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Budget for a whole HTTP request: the longest tool call plus headroom
    /// for the metadata pre-fetch that precedes a download.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.download_secs + self.timeouts.info_secs + 30)
    }

    /// Staging area yt-dlp writes into before artifacts are published.
    pub fn staging_dir(&self) -> PathBuf {
        self.downloads_dir.join(crate::downloader::STAGING_DIR_NAME)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| SocialSaveError::Config(format!("{} has an invalid value: {}", key, raw))),
        None => Ok(default),
    }
}
