//! SocialSave library
//!
//! HTTP façade over yt-dlp: validates and classifies social media URLs, asks
//! yt-dlp for metadata or media, and keeps downloaded files around for a
//! limited time.

pub mod downloader;
pub mod extractor;
pub mod server;
pub mod utils;

// Re-export main types for easier use
pub use downloader::{DownloadOrchestrator, DownloadedArtifact, RetentionSweeper};
pub use extractor::{MediaFormat, ProcessRunner, ToolRunner, VideoMetadata, YtDlpExtractor};
pub use server::{build_router, AppState};
pub use utils::{Platform, ServerSettings, SocialSaveError};
