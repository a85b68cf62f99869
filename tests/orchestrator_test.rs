//! Download orchestrator against a recording yt-dlp double

mod common;

use std::sync::Arc;

use common::{DownloadReply, RecordingRunner};
use socialsave::downloader::{DownloadOrchestrator, RetentionSweeper};
use socialsave::extractor::YtDlpExtractor;
use socialsave::utils::{SocialSaveError, ToolTimeouts};
use tempfile::tempdir;

fn orchestrator(runner: Arc<RecordingRunner>, dir: &std::path::Path) -> DownloadOrchestrator {
    let extractor = Arc::new(YtDlpExtractor::new(runner, ToolTimeouts::default(), 1024 * 1024));
    DownloadOrchestrator::new(extractor, dir.to_path_buf(), "best[height<=720]")
}

#[tokio::test]
async fn test_artifact_is_described_from_disk() {
    let dir = tempdir().unwrap();
    let runner = Arc::new(RecordingRunner {
        download: DownloadReply::write("Holiday #2", "webm", 1536),
        ..Default::default()
    });
    let orchestrator = orchestrator(runner, dir.path());

    let artifact = orchestrator
        .download("https://vimeo.com/12345", None)
        .await
        .unwrap();

    assert_eq!(artifact.file_id.len(), 16);
    assert_eq!(artifact.display_filename, "Holiday #2.webm");
    assert_eq!(artifact.file_name, format!("{}_Holiday #2.webm", artifact.file_id));
    assert_eq!(artifact.size_bytes, 1536);
    assert_eq!(
        artifact.served_path,
        format!("/downloads/{}_Holiday%20%232.webm", artifact.file_id)
    );
    assert_eq!(artifact.path, dir.path().join(&artifact.file_name));
    assert!(artifact.path.is_file());
}

#[tokio::test]
async fn test_each_download_gets_its_own_id() {
    let dir = tempdir().unwrap();
    let runner = Arc::new(RecordingRunner::default());
    let orchestrator = orchestrator(runner, dir.path());

    let first = orchestrator.download("https://youtu.be/a", None).await.unwrap();
    let second = orchestrator.download("https://youtu.be/a", None).await.unwrap();

    assert_ne!(first.file_id, second.file_id);
    assert!(first.path.is_file());
    assert!(second.path.is_file());
}

#[tokio::test]
async fn test_blank_quality_uses_default() {
    let dir = tempdir().unwrap();
    let runner = Arc::new(RecordingRunner::default());
    let orchestrator = orchestrator(runner.clone(), dir.path());

    orchestrator
        .download("https://youtu.be/a", Some("   "))
        .await
        .unwrap();

    let args = &runner.download_calls()[0];
    let format_at = args.iter().position(|a| a == "-f").unwrap();
    assert_eq!(args[format_at + 1], "best[height<=720]");
}

#[tokio::test]
async fn test_missing_file_after_success_is_artifact_not_found() {
    let dir = tempdir().unwrap();
    let runner = Arc::new(RecordingRunner {
        download: DownloadReply::Nothing,
        ..Default::default()
    });
    let orchestrator = orchestrator(runner, dir.path());

    let err = orchestrator
        .download_audio("https://soundcloud.com/x/y")
        .await
        .unwrap_err();
    assert!(matches!(err, SocialSaveError::ArtifactNotFound(_)));
}

#[tokio::test]
async fn test_invalid_url_never_reaches_tool() {
    let dir = tempdir().unwrap();
    let runner = Arc::new(RecordingRunner::default());
    let orchestrator = orchestrator(runner.clone(), dir.path());

    let err = orchestrator.download("file:///etc/passwd", None).await.unwrap_err();
    assert!(matches!(err, SocialSaveError::InvalidUrl(_)));
    assert_eq!(runner.call_count(), 0);
}

#[tokio::test]
async fn test_directories_are_recreated_when_removed() {
    let root = tempdir().unwrap();
    let downloads = root.path().join("downloads");
    let runner = Arc::new(RecordingRunner::default());
    let orchestrator = orchestrator(runner, &downloads);

    orchestrator.prepare().await.unwrap();
    std::fs::remove_dir_all(&downloads).unwrap();

    let artifact = orchestrator.download("https://youtu.be/a", None).await.unwrap();
    assert!(artifact.path.is_file());
    assert!(orchestrator.staging_dir().is_dir());
}

#[tokio::test]
async fn test_backdated_download_survives_the_next_sweep() {
    let dir = tempdir().unwrap();
    let month = std::time::Duration::from_secs(30 * 24 * 3600);
    let runner = Arc::new(RecordingRunner {
        download: DownloadReply::backdated("Old Upload", "mp4", 512, month),
        ..Default::default()
    });
    let orchestrator = orchestrator(runner.clone(), dir.path());

    let artifact = orchestrator.download("https://youtu.be/a", None).await.unwrap();

    let hour = std::time::Duration::from_secs(3600);
    let sweeper = RetentionSweeper::new(
        vec![dir.path().to_path_buf(), orchestrator.staging_dir().to_path_buf()],
        2 * hour,
        hour,
    );
    let report = sweeper.sweep_once().await;

    assert_eq!(report.deleted, 0);
    assert!(artifact.path.is_file());
    assert!(runner.download_calls()[0].iter().any(|a| a == "--no-mtime"));
}
