//! Periodic cleanup of downloaded artifacts
//!
//! Deletes files whose last modification is older than the retention period.
//! Only regular files directly inside the configured directories are touched.
//! A file still being written is always younger than the threshold, so no
//! coordination with running downloads is needed.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Outcome of one sweep pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Deletes aged artifacts on a fixed schedule
#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    dirs: Vec<PathBuf>,
    max_age: Duration,
    interval: Duration,
}

impl RetentionSweeper {
    pub fn new(dirs: Vec<PathBuf>, max_age: Duration, interval: Duration) -> Self {
        Self {
            dirs,
            max_age,
            interval,
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Sweep every directory once, using the current time.
    pub async fn sweep_once(&self) -> SweepReport {
        self.sweep_at(SystemTime::now()).await
    }

    /// Sweep every directory once, measuring ages against `now`.
    pub async fn sweep_at(&self, now: SystemTime) -> SweepReport {
        let mut report = SweepReport::default();
        for dir in &self.dirs {
            self.sweep_dir(dir, now, &mut report).await;
        }
        report
    }

    async fn sweep_dir(&self, dir: &Path, now: SystemTime, report: &mut SweepReport) {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Sweep skipped, {:?} does not exist", dir);
                return;
            }
            Err(e) => {
                error!("Failed to read {:?}: {}", dir, e);
                report.failed += 1;
                return;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    error!("Failed to list {:?}: {}", dir, e);
                    report.failed += 1;
                    break;
                }
            };

            let path = entry.path();
            let metadata = match entry.metadata().await {
                Ok(m) => m,
                Err(e) => {
                    // Removed by someone else between listing and stat.
                    debug!("Skipping {:?}: {}", path, e);
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }
            report.scanned += 1;

            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or(Duration::ZERO);
            if age <= self.max_age {
                continue;
            }

            match fs::remove_file(&path).await {
                Ok(()) => {
                    info!("Deleted old file: {:?} (age {}s)", path, age.as_secs());
                    report.deleted += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!("Failed to delete {:?}: {}", path, e);
                    report.failed += 1;
                }
            }
        }
    }

    /// Run the sweep loop until `cancel` is triggered. The first pass happens
    /// immediately so leftovers from a previous run are reclaimed at startup.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            "Retention sweeper started (max age {}s, every {}s)",
            self.max_age.as_secs(),
            self.interval.as_secs()
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Retention sweeper stopping");
                    break;
                }
                _ = interval.tick() => {
                    let report = self.sweep_once().await;
                    if report.deleted > 0 || report.failed > 0 {
                        info!(
                            "Sweep finished: {} scanned, {} deleted, {} failed",
                            report.scanned, report.deleted, report.failed
                        );
                    } else {
                        debug!("Sweep finished: nothing to delete ({} scanned)", report.scanned);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_missing_directory_is_not_an_error() {
        let sweeper = RetentionSweeper::new(vec![PathBuf::from("/no/such/dir")], HOUR, HOUR);
        assert_eq!(sweeper.sweep_once().await, SweepReport::default());
    }

    #[tokio::test]
    async fn test_young_files_survive() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("fresh.mp4"), b"x").unwrap();

        let sweeper = RetentionSweeper::new(vec![dir.path().to_path_buf()], 2 * HOUR, HOUR);
        let report = sweeper.sweep_once().await;
        assert_eq!(report.scanned, 1);
        assert_eq!(report.deleted, 0);
        assert!(dir.path().join("fresh.mp4").exists());
    }

    #[tokio::test]
    async fn test_sweep_at_future_time_deletes() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("old.mp4"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let sweeper = RetentionSweeper::new(vec![dir.path().to_path_buf()], 2 * HOUR, HOUR);
        let report = sweeper.sweep_at(SystemTime::now() + 3 * HOUR).await;
        assert_eq!(report.deleted, 1);
        assert!(!dir.path().join("old.mp4").exists());
        assert!(dir.path().join("nested").is_dir());
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let sweeper = RetentionSweeper::new(Vec::new(), HOUR, HOUR);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(sweeper.run(cancel.clone()));
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sweeper did not stop")
            .expect("sweeper panicked");
    }
}
