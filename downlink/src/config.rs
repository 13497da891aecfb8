//! Configuration for the download engine.

use std::path::PathBuf;
use std::time::Duration;

/// Default upper bound on a single transfer chunk, in bytes.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 1024;

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300; // 5 minutes

/// Default controller polling cadence in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Configuration shared by all downloads in a registry.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory where destination files are written.
    ///
    /// File names are derived from the final path segment of each URL.
    pub download_dir: PathBuf,

    /// HTTP request timeout, passed to the underlying client.
    ///
    /// The engine itself has no timeouts; a client-level timeout surfaces
    /// as a transfer fault.
    pub timeout: Duration,

    /// Upper bound on a single chunk read/write, in bytes.
    ///
    /// This also bounds how much extra data may be written after a pause or
    /// cancel request before the transfer thread observes it.
    pub max_chunk_size: usize,

    /// Cadence at which a controller is expected to poll snapshots.
    pub poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("."),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl EngineConfig {
    /// Create a new configuration with the given download directory.
    pub fn new(download_dir: PathBuf) -> Self {
        Self {
            download_dir,
            ..Default::default()
        }
    }

    /// Set the HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum chunk size.
    ///
    /// Values below 1 are clamped to 1.
    pub fn with_max_chunk_size(mut self, max_chunk_size: usize) -> Self {
        self.max_chunk_size = max_chunk_size.max(1);
        self
    }

    /// Set the expected polling cadence.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}
