//! Error types for the transfer engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

/// Faults that abort a transfer.
///
/// All of these are absorbed at the transfer-thread boundary into the
/// `Error` status; callers observe them through [`Download::status`] and
/// [`Download::error`], never as a propagated `Err`.
///
/// [`Download::status`]: super::Download::status
/// [`Download::error`]: super::Download::error
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The URL has no final path segment to derive a file name from.
    #[error("cannot derive a file name from {url}")]
    InvalidUrl { url: String },

    /// Building the HTTP client failed.
    #[error("failed to build HTTP client: {reason}")]
    ClientBuild { reason: String },

    /// Issuing the ranged request failed.
    #[error("request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    /// The server answered with a non-success status code.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    /// The server ignored the `Range` header on a resumed request.
    #[error("server ignored the range request for {url}")]
    RangeIgnored { url: String },

    /// The response declares no usable content length.
    #[error("response from {url} has no usable content-length")]
    MissingContentLength { url: String },

    /// Reading from the response stream failed.
    #[error("failed to read from response stream: {source}")]
    StreamRead {
        #[source]
        source: io::Error,
    },

    /// Writing or seeking the destination file failed.
    #[error("failed to write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Spawning the background transfer thread failed.
    #[error("failed to start transfer thread: {source}")]
    TaskSpawn {
        #[source]
        source: io::Error,
    },
}
