//! Local artifact lifecycle: creation by the orchestrator, deletion by the sweeper

pub mod orchestrator;
pub mod sweeper;

pub use orchestrator::{generate_file_id, locate_artifact, DownloadOrchestrator, DownloadedArtifact};
pub use sweeper::{RetentionSweeper, SweepReport};

/// Staging sub-directory of the downloads directory yt-dlp writes into
pub const STAGING_DIR_NAME: &str = ".incoming";

/// URL prefix the downloads directory is served under
pub const PUBLIC_PREFIX: &str = "/downloads";
