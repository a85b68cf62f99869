//! Real process execution through `sh`, standing in for yt-dlp
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use socialsave::extractor::{Invocation, ProcessRunner, RunLimits, ToolRunner, YtDlpExtractor};
use socialsave::utils::{SocialSaveError, ToolTimeouts};
use tempfile::tempdir;

fn limits(timeout: Duration, max_output_bytes: usize) -> RunLimits {
    RunLimits {
        operation: "test",
        timeout,
        max_output_bytes,
    }
}

fn script(body: &str) -> Invocation {
    Invocation::new().option("-c", body).flag("sh")
}

#[tokio::test]
async fn test_stdout_is_returned() {
    let runner = ProcessRunner::new("sh");
    let out = runner
        .run(&script("printf 'hello'"), limits(Duration::from_secs(10), 1024))
        .await
        .unwrap();
    assert_eq!(out, "hello");
}

#[tokio::test]
async fn test_target_arrives_as_one_argument() {
    let runner = ProcessRunner::new("sh");
    let url = "https://example.com/v?id=1&x=$(id);echo `whoami` | cat";
    let invocation = script(r#"printf '%s\n' "$@""#).target(url);

    let out = runner
        .run(&invocation, limits(Duration::from_secs(10), 4096))
        .await
        .unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines, vec!["--", url]);
}

#[tokio::test]
async fn test_slow_process_times_out() {
    let runner = ProcessRunner::new("sh");
    let started = Instant::now();

    let err = runner
        .run(&script("sleep 10"), limits(Duration::from_millis(200), 1024))
        .await
        .unwrap_err();

    assert!(matches!(err, SocialSaveError::ToolTimeout { operation: "test", .. }));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_runaway_output_is_cut_off() {
    let runner = ProcessRunner::new("sh");
    let err = runner
        .run(
            &script("yes socialsave | head -c 200000"),
            limits(Duration::from_secs(10), 1000),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SocialSaveError::OutputTooLarge { limit: 1000 }));
}

#[tokio::test]
async fn test_non_zero_exit_carries_stderr() {
    let runner = ProcessRunner::new("sh");
    let err = runner
        .run(
            &script("echo 'ERROR: Private video' >&2; exit 1"),
            limits(Duration::from_secs(10), 1024),
        )
        .await
        .unwrap_err();
    match err {
        SocialSaveError::ToolFailure(message) => assert_eq!(message, "ERROR: Private video"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_binary_is_reported() {
    let runner = ProcessRunner::new("/definitely/not/here/yt-dlp");
    let err = runner
        .run(&Invocation::new().flag("--version"), limits(Duration::from_secs(5), 1024))
        .await
        .unwrap_err();
    assert!(matches!(err, SocialSaveError::YtDlpNotFound));
}

/// A fake yt-dlp that answers the JSON record for any URL.
fn fake_ytdlp(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("yt-dlp");
    let body = r#"#!/bin/sh
cat <<'EOF'
{"title": "Fake", "uploader": "Bot", "duration": 59.9, "formats": [
  {"url": "https://cdn.example.com/low.mp4", "vcodec": "avc1", "acodec": "mp4a", "height": 240},
  {"url": "https://cdn.example.com/high.mp4", "vcodec": "avc1", "acodec": "mp4a", "height": 480}
]}
EOF
"#;
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[tokio::test]
async fn test_extractor_parses_record_from_real_process() {
    let dir = tempdir().unwrap();
    let runner = Arc::new(ProcessRunner::new(fake_ytdlp(dir.path())));
    let extractor = YtDlpExtractor::new(runner, ToolTimeouts::default(), 1024 * 1024);

    let meta = extractor
        .fetch_record("https://www.youtube.com/watch?v=abc")
        .await
        .unwrap();

    assert_eq!(meta.title, "Fake");
    assert_eq!(meta.uploader, "Bot");
    assert_eq!(meta.duration_seconds, Some(59.9));
    assert_eq!(meta.formats.len(), 2);
    assert_eq!(extractor.runner_id(), "yt-dlp");
}
