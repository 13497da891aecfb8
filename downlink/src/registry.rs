//! Registry of live downloads: the controller surface.
//!
//! The registry owns a collection of [`Download`] engines, creates them on
//! demand, routes pause/resume/cancel/clear actions to individual entries,
//! and produces point-in-time snapshots for a polling front-end. Polling
//! snapshots on a fixed cadence is the only notification mechanism; engines
//! never push updates.
//!
//! Actions are guarded here by the status predicates on [`DownloadStatus`]:
//! a pause routed to a completed download, or a clear routed to an active
//! one, is silently dropped.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::config::EngineConfig;
use crate::download::{Download, DownloadStatus, TransferSource};

/// Point-in-time view of one download, for display.
#[derive(Debug, Clone)]
pub struct DownloadSnapshot {
    /// Source URL.
    pub url: String,
    /// Destination file name.
    pub file_name: String,
    /// Total size in bytes, or `None` until the first response header.
    pub size: Option<u64>,
    /// Bytes durably written so far.
    pub bytes_transferred: u64,
    /// Whole percent in `[0, 100]`, or `None` while the size is unknown.
    pub progress: Option<u8>,
    /// Current lifecycle status.
    pub status: DownloadStatus,
    /// Message of the fault that moved the download into `Error`, if any.
    pub error: Option<String>,
}

/// Collection of download engines sharing one configuration.
pub struct DownloadRegistry {
    config: EngineConfig,
    downloads: Mutex<Vec<Arc<Download>>>,
}

impl DownloadRegistry {
    /// Create an empty registry.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            downloads: Mutex::new(Vec::new()),
        }
    }

    /// Add a download for `url`. It starts transferring immediately.
    ///
    /// Returns the index of the new entry.
    pub fn add(&self, url: impl Into<String>) -> usize {
        let download = Download::start(url, &self.config);
        self.insert(download)
    }

    /// Add a download over an injected transfer source, writing to
    /// `file_name` under the configured download directory.
    pub fn add_with_source(
        &self,
        url: impl Into<String>,
        file_name: &str,
        source: Arc<dyn TransferSource>,
    ) -> usize {
        let dest = self.config.download_dir.join(file_name);
        let download =
            Download::start_with_source(url, dest, source, self.config.max_chunk_size);
        self.insert(download)
    }

    fn insert(&self, download: Arc<Download>) -> usize {
        let mut downloads = self.downloads.lock();
        downloads.push(download);
        downloads.len() - 1
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.downloads.lock().len()
    }

    /// Whether the registry holds no entries.
    pub fn is_empty(&self) -> bool {
        self.downloads.lock().is_empty()
    }

    /// The download at `index`, if present.
    pub fn get(&self, index: usize) -> Option<Arc<Download>> {
        self.downloads.lock().get(index).cloned()
    }

    /// Route a pause to the download at `index`, if pausable.
    pub fn pause(&self, index: usize) {
        if let Some(download) = self.get(index) {
            if download.status().can_pause() {
                download.pause();
            }
        }
    }

    /// Route a resume to the download at `index`, if resumable.
    pub fn resume(&self, index: usize) {
        if let Some(download) = self.get(index) {
            if download.status().can_resume() {
                download.resume();
            }
        }
    }

    /// Route a cancel to the download at `index`, if cancellable.
    pub fn cancel(&self, index: usize) {
        if let Some(download) = self.get(index) {
            if download.status().can_cancel() {
                download.cancel();
            }
        }
    }

    /// Remove the download at `index` if it is in a clearable state.
    ///
    /// Returns whether an entry was removed. Active or paused downloads are
    /// never removed; their on-disk partial files are likewise untouched.
    pub fn clear(&self, index: usize) -> bool {
        let mut downloads = self.downloads.lock();
        match downloads.get(index) {
            Some(download) if download.status().can_clear() => {
                let removed = downloads.remove(index);
                info!(url = %removed.url(), status = %removed.status(), "download cleared");
                true
            }
            _ => false,
        }
    }

    /// One read pass over every live download.
    ///
    /// This is the polling contract: each field is a single atomic load, so
    /// a snapshot never blocks a transfer thread.
    pub fn snapshot(&self) -> Vec<DownloadSnapshot> {
        self.downloads
            .lock()
            .iter()
            .map(|download| DownloadSnapshot {
                url: download.url().to_string(),
                file_name: download.file_name().to_string(),
                size: download.size(),
                bytes_transferred: download.bytes_transferred(),
                progress: download.progress(),
                status: download.status(),
                error: download.error(),
            })
            .collect()
    }

    /// Whether every download is in a terminal state.
    pub fn all_terminal(&self) -> bool {
        self.downloads
            .lock()
            .iter()
            .all(|download| download.status().is_terminal())
    }

    /// Cancel everything still active and wait for all transfer threads.
    ///
    /// Bounded by one in-flight chunk per download. Partial files are left
    /// on disk for the caller to clean up or resume in a later run.
    pub fn shutdown(&self) {
        let downloads: Vec<_> = self.downloads.lock().clone();
        for download in &downloads {
            if download.status().can_cancel() {
                download.cancel();
            }
        }
        for download in &downloads {
            download.join();
        }
        info!(count = downloads.len(), "registry shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::{DownloadResult, SourceStream};
    use std::io::{self, Read};
    use std::time::{Duration, Instant};

    /// Source that serves `len` zero bytes, pacing each read so tests can
    /// observe (and interrupt) an in-flight transfer.
    struct PacedSource {
        len: u64,
        delay: Duration,
    }

    impl PacedSource {
        fn new(len: u64, delay: Duration) -> Self {
            Self { len, delay }
        }
    }

    impl TransferSource for PacedSource {
        fn open(&self, offset: u64) -> DownloadResult<SourceStream> {
            Ok(SourceStream {
                content_length: self.len - offset,
                reader: Box::new(PacedReader {
                    remaining: (self.len - offset) as usize,
                    delay: self.delay,
                }),
            })
        }
    }

    struct PacedReader {
        remaining: usize,
        delay: Duration,
    }

    impl Read for PacedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.remaining == 0 {
                return Ok(0);
            }
            std::thread::sleep(self.delay);
            let take = buf.len().min(self.remaining);
            buf[..take].iter_mut().for_each(|b| *b = 0);
            self.remaining -= take;
            Ok(take)
        }
    }

    fn test_registry() -> (DownloadRegistry, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::new(dir.path().to_path_buf());
        (DownloadRegistry::new(config), dir)
    }

    fn wait_for(mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "timed out waiting for condition");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_snapshot_reflects_live_downloads() {
        let (registry, _dir) = test_registry();
        assert!(registry.is_empty());

        let source = Arc::new(PacedSource::new(2048, Duration::from_millis(1)));
        let index = registry.add_with_source("http://example.com/a.bin", "a.bin", source);
        assert_eq!(index, 0);
        assert_eq!(registry.len(), 1);

        wait_for(|| registry.all_terminal());

        let snapshots = registry.snapshot();
        assert_eq!(snapshots.len(), 1);
        let snapshot = &snapshots[0];
        assert_eq!(snapshot.url, "http://example.com/a.bin");
        assert_eq!(snapshot.file_name, "a.bin");
        assert_eq!(snapshot.size, Some(2048));
        assert_eq!(snapshot.bytes_transferred, 2048);
        assert_eq!(snapshot.progress, Some(100));
        assert_eq!(snapshot.status, DownloadStatus::Complete);
        assert_eq!(snapshot.error, None);
    }

    #[test]
    fn test_clear_is_guarded_by_status() {
        let (registry, _dir) = test_registry();

        // A large paced transfer stays active long enough to test the guard.
        let source = Arc::new(PacedSource::new(500_000, Duration::from_millis(2)));
        registry.add_with_source("http://example.com/big.bin", "big.bin", source);

        assert!(!registry.clear(0), "active download must not be cleared");
        assert_eq!(registry.len(), 1);

        registry.cancel(0);
        wait_for(|| registry.all_terminal());

        assert!(registry.clear(0));
        assert!(registry.is_empty());
        // Out of range is a no-op.
        assert!(!registry.clear(0));
    }

    #[test]
    fn test_actions_route_by_index_and_respect_gating() {
        let (registry, _dir) = test_registry();

        let source = Arc::new(PacedSource::new(500_000, Duration::from_millis(2)));
        registry.add_with_source("http://example.com/big.bin", "big.bin", source);

        registry.pause(0);
        let download = registry.get(0).unwrap();
        wait_for(|| download.status() == DownloadStatus::Paused);
        download.join();

        // Pause routed to a paused download is dropped by the guard.
        registry.pause(0);
        assert_eq!(download.status(), DownloadStatus::Paused);

        registry.resume(0);
        wait_for(|| download.status() == DownloadStatus::Downloading);

        registry.cancel(0);
        wait_for(|| registry.all_terminal());
        assert_eq!(download.status(), DownloadStatus::Cancelled);

        // Actions against missing indices are no-ops.
        registry.pause(7);
        registry.resume(7);
        registry.cancel(7);
    }

    #[test]
    fn test_shutdown_cancels_and_joins_everything() {
        let (registry, _dir) = test_registry();

        for name in ["a.bin", "b.bin", "c.bin"] {
            let source = Arc::new(PacedSource::new(500_000, Duration::from_millis(2)));
            registry.add_with_source(format!("http://example.com/{name}"), name, source);
        }

        registry.shutdown();

        assert!(registry.all_terminal());
        for snapshot in registry.snapshot() {
            assert_eq!(snapshot.status, DownloadStatus::Cancelled);
        }
    }
}
