//! The transfer engine: one resumable download and its background thread.
//!
//! A [`Download`] owns the full lifecycle of a single target: the shared
//! [`TransferState`], the destination file, and the one background transfer
//! thread. External callers mutate it only through `pause`, `resume` and
//! `cancel`; the thread observes those changes at its next loop iteration.
//!
//! # Concurrency
//!
//! Each download runs on its own thread, detached from the controller except
//! for the [`JoinHandle`] kept for clean teardown. Cancellation is
//! cooperative: `pause` and `cancel` flip the shared status and rely on the
//! transfer loop's next check to stop, so at most one in-flight chunk (at
//! most `max_chunk_size` bytes) may still be written after the request.
//!
//! The byte counter advances strictly after the corresponding file write
//! returns, so the observable pair (file length, counter) never shows the
//! counter ahead of the bytes on disk.

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;

use super::error::{DownloadError, DownloadResult};
use super::source::{HttpSource, TransferSource};
use super::state::TransferState;
use super::status::DownloadStatus;

/// A single resumable download and its background transfer thread.
pub struct Download {
    /// Immutable source identifier, set at creation.
    url: String,
    /// Destination file name: the final path segment of the URL, derived
    /// once at creation and never re-derived.
    file_name: String,
    /// Full destination path.
    dest: PathBuf,
    /// Upper bound on a single chunk read/write.
    max_chunk_size: usize,
    /// Fields shared with the transfer thread.
    state: Arc<TransferState>,
    /// `None` when creation failed fast; such a download stays in `Error`.
    source: Option<Arc<dyn TransferSource>>,
    /// Handle of the currently (or most recently) running transfer thread.
    handle: Mutex<Option<JoinHandle<()>>>,
    /// Message of the fault that moved the download into `Error`, if any.
    last_error: Mutex<Option<String>>,
}

impl Download {
    /// Create a download for `url` and immediately start transferring.
    ///
    /// The destination is `config.download_dir` joined with the URL's final
    /// path segment. Creation faults (no derivable file name, HTTP client
    /// build failure) do not propagate: the engine is returned already in
    /// `Error` status with the fault recorded.
    pub fn start(url: impl Into<String>, config: &EngineConfig) -> Arc<Self> {
        let url = url.into();

        let prepared = file_name_from_url(&url)
            .ok_or_else(|| DownloadError::InvalidUrl { url: url.clone() })
            .and_then(|file_name| {
                HttpSource::new(url.clone(), config.timeout)
                    .map(|source| (file_name, Arc::new(source) as Arc<dyn TransferSource>))
            });

        match prepared {
            Ok((file_name, source)) => {
                let dest = config.download_dir.join(&file_name);
                let engine = Arc::new(Self::new(
                    url,
                    file_name,
                    dest,
                    config.max_chunk_size,
                    Some(source),
                ));
                engine.spawn_transfer();
                engine
            }
            Err(err) => {
                warn!(url = %url, error = %err, "download failed to start");
                let engine = Arc::new(Self::new(
                    url,
                    String::new(),
                    PathBuf::new(),
                    config.max_chunk_size,
                    None,
                ));
                engine.record_error(err);
                engine
            }
        }
    }

    /// Create a download over an injected source, writing to `dest`.
    ///
    /// This is the seam for non-HTTP sources and for tests.
    pub fn start_with_source(
        url: impl Into<String>,
        dest: impl Into<PathBuf>,
        source: Arc<dyn TransferSource>,
        max_chunk_size: usize,
    ) -> Arc<Self> {
        let dest = dest.into();
        let file_name = dest
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let engine = Arc::new(Self::new(
            url.into(),
            file_name,
            dest,
            max_chunk_size,
            Some(source),
        ));
        engine.spawn_transfer();
        engine
    }

    fn new(
        url: String,
        file_name: String,
        dest: PathBuf,
        max_chunk_size: usize,
        source: Option<Arc<dyn TransferSource>>,
    ) -> Self {
        Self {
            url,
            file_name,
            dest,
            max_chunk_size,
            state: Arc::new(TransferState::new()),
            source,
            handle: Mutex::new(None),
            last_error: Mutex::new(None),
        }
    }

    /// Request a pause.
    ///
    /// The transfer thread observes the change at its next loop check; at
    /// most one in-flight chunk may still be written. No-op unless currently
    /// downloading.
    pub fn pause(&self) {
        if self
            .state
            .transition(DownloadStatus::Downloading, DownloadStatus::Paused)
        {
            debug!(url = %self.url, "pause requested");
        }
    }

    /// Resume a paused or failed download from the current offset.
    ///
    /// Waits for the previous transfer thread to exit (it does so within one
    /// chunk of the pause), then starts a new one continuing from
    /// `bytes_transferred`. No-op unless paused or in `Error`.
    pub fn resume(self: &Arc<Self>) {
        if self.source.is_none() {
            // Creation never produced a source; nothing to restart.
            return;
        }
        if !self.status().can_resume() {
            return;
        }

        // Joining before the status flips keeps the one-thread-per-download
        // invariant: the old thread can only observe the old status, and it
        // exits within one chunk of the pause.
        self.join_transfer();

        let resumed = self
            .state
            .transition(DownloadStatus::Paused, DownloadStatus::Downloading)
            || self
                .state
                .transition(DownloadStatus::Error, DownloadStatus::Downloading);

        if resumed {
            debug!(
                url = %self.url,
                offset = self.state.bytes_transferred(),
                "resuming download"
            );
            self.spawn_transfer();
        }
    }

    /// Request cancellation.
    ///
    /// Cooperative: the transfer thread stops at its next status check and
    /// the partial file is left on disk. No-op unless downloading or paused.
    pub fn cancel(&self) {
        let cancelled = self
            .state
            .transition(DownloadStatus::Downloading, DownloadStatus::Cancelled)
            || self
                .state
                .transition(DownloadStatus::Paused, DownloadStatus::Cancelled);

        if cancelled {
            debug!(url = %self.url, "cancel requested");
        }
    }

    /// Wait for the background transfer thread to exit, if one is running.
    pub fn join(&self) {
        self.join_transfer();
    }

    /// The source URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The destination file name derived from the URL.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The full destination path.
    pub fn destination(&self) -> &Path {
        &self.dest
    }

    /// Total resource size, or `None` until the first response header.
    pub fn size(&self) -> Option<u64> {
        self.state.total_size()
    }

    /// Bytes durably written to the destination file so far.
    pub fn bytes_transferred(&self) -> u64 {
        self.state.bytes_transferred()
    }

    /// Progress in whole percent, or `None` while the size is unknown.
    pub fn progress(&self) -> Option<u8> {
        self.state.progress_percent()
    }

    /// Current lifecycle status.
    pub fn status(&self) -> DownloadStatus {
        self.state.status()
    }

    /// Message of the fault that moved the download into `Error`, if any.
    pub fn error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    fn spawn_transfer(self: &Arc<Self>) {
        let engine = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name(format!("downlink-{}", self.file_name))
            .spawn(move || engine.run_transfer());

        match spawned {
            Ok(handle) => {
                *self.handle.lock() = Some(handle);
            }
            Err(source) => {
                self.record_error(DownloadError::TaskSpawn { source });
            }
        }
    }

    fn join_transfer(&self) {
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    fn record_error(&self, err: DownloadError) {
        *self.last_error.lock() = Some(err.to_string());
        self.state.set_status(DownloadStatus::Error);
    }

    /// Transfer thread entry point: faults are fully absorbed here.
    fn run_transfer(self: Arc<Self>) {
        let source = match &self.source {
            Some(source) => Arc::clone(source),
            None => return,
        };

        if let Err(err) = self.transfer(source.as_ref()) {
            warn!(url = %self.url, error = %err, "transfer failed");
            self.record_error(err);
        }
    }

    /// One transfer attempt, from the current offset to end of stream.
    fn transfer(&self, source: &dyn TransferSource) -> DownloadResult<()> {
        let offset = self.state.bytes_transferred();
        let stream = source.open(offset)?;

        // First observation only; see TransferState::set_total_size.
        self.state.set_total_size(stream.content_length);
        let total = self.state.total_size().unwrap_or(0);

        // Create on first open, position without truncation otherwise.
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&self.dest)
            .map_err(|e| DownloadError::FileWrite {
                path: self.dest.clone(),
                source: e,
            })?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| DownloadError::FileWrite {
                path: self.dest.clone(),
                source: e,
            })?;

        debug!(url = %self.url, offset, total, "transfer started");

        let mut reader = stream.reader;
        let mut buf = vec![0u8; self.max_chunk_size];

        while self.state.status() == DownloadStatus::Downloading {
            let remaining = total.saturating_sub(self.state.bytes_transferred());
            if remaining == 0 {
                break;
            }

            let want = remaining.min(self.max_chunk_size as u64) as usize;
            let read = reader
                .read(&mut buf[..want])
                .map_err(|source| DownloadError::StreamRead { source })?;
            if read == 0 {
                // End of stream, whether or not the declared total was reached.
                break;
            }

            // Write strictly before advancing the counter.
            file.write_all(&buf[..read])
                .map_err(|e| DownloadError::FileWrite {
                    path: self.dest.clone(),
                    source: e,
                })?;
            self.state.advance(read as u64);
        }

        file.flush().map_err(|e| DownloadError::FileWrite {
            path: self.dest.clone(),
            source: e,
        })?;

        // Natural end of stream completes the download; an external pause or
        // cancel leaves its own status in place (the CAS loses).
        if self
            .state
            .transition(DownloadStatus::Downloading, DownloadStatus::Complete)
        {
            info!(
                url = %self.url,
                bytes = self.state.bytes_transferred(),
                "download complete"
            );
        }

        Ok(())
    }
}

/// Derive the destination file name: the final path segment of the URL,
/// with any query string or fragment stripped.
fn file_name_from_url(url: &str) -> Option<String> {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let without_query = without_fragment.split('?').next().unwrap_or(without_fragment);
    let segment = without_query.rsplit('/').next().unwrap_or(without_query);

    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}
