use std::sync::Arc;

use crate::downloader::DownloadOrchestrator;
use crate::extractor::{ToolRunner, YtDlpExtractor};
use crate::utils::ServerSettings;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<ServerSettings>,
    pub extractor: Arc<YtDlpExtractor>,
    pub orchestrator: Arc<DownloadOrchestrator>,
}

impl AppState {
    /// Wire the extractor and orchestrator around `runner`.
    pub fn new(settings: ServerSettings, runner: Arc<dyn ToolRunner>) -> Self {
        let extractor = Arc::new(YtDlpExtractor::new(
            runner,
            settings.timeouts.clone(),
            settings.max_output_bytes,
        ));
        let orchestrator = Arc::new(DownloadOrchestrator::new(
            extractor.clone(),
            settings.downloads_dir.clone(),
            settings.default_quality.clone(),
        ));

        Self {
            settings: Arc::new(settings),
            extractor,
            orchestrator,
        }
    }
}
