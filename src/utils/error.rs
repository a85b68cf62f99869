//! Error handling for SocialSave

use thiserror::Error;

/// Convenience alias used across the library.
pub type Result<T> = std::result::Result<T, SocialSaveError>;

/// Main error type for SocialSave
#[derive(Debug, Error)]
pub enum SocialSaveError {
    #[error("Valid video URL is required")]
    InvalidUrl(String),

    #[error("Unsupported platform: {0}")]
    UnknownPlatform(String),

    #[error("This endpoint is for {expected} videos, but you provided a {detected} URL")]
    PlatformMismatch { expected: String, detected: String },

    #[error("yt-dlp not found. Please install yt-dlp")]
    YtDlpNotFound,

    #[error("{operation} timed out after {secs}s")]
    ToolTimeout { operation: &'static str, secs: u64 },

    #[error("yt-dlp failed: {0}")]
    ToolFailure(String),

    #[error("yt-dlp output exceeded {limit} bytes")]
    OutputTooLarge { limit: usize },

    #[error("Failed to parse yt-dlp output: {0}")]
    ParseError(String),

    #[error("No downloadable format found")]
    NoDownloadableFormat,

    #[error("Downloaded file not found: {0}")]
    ArtifactNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl SocialSaveError {
    /// Errors caused by the caller's input. These never reach yt-dlp.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            SocialSaveError::InvalidUrl(_) | SocialSaveError::PlatformMismatch { .. }
        )
    }

    /// Errors raised by the external tool itself (spawn, exit status, output).
    /// The metadata endpoints degrade on these instead of failing.
    pub fn is_tool_error(&self) -> bool {
        matches!(
            self,
            SocialSaveError::YtDlpNotFound
                | SocialSaveError::ToolTimeout { .. }
                | SocialSaveError::ToolFailure(_)
                | SocialSaveError::OutputTooLarge { .. }
                | SocialSaveError::ParseError(_)
                | SocialSaveError::SerializationError(_)
        )
    }
}
