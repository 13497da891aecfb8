//! The transfer source seam: ranged access to a remote resource.
//!
//! [`TransferSource`] is the boundary between the transfer engine and the
//! network. The production implementation is [`HttpSource`], which issues
//! blocking ranged GET requests; tests substitute in-memory sources to drive
//! the engine deterministically.

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use super::error::{DownloadError, DownloadResult};

/// An open response stream positioned at the requested offset.
pub struct SourceStream {
    /// Declared length of the returned range, in bytes.
    ///
    /// For a request at offset zero this equals the full resource size; for
    /// a resumed request it is the remaining byte count. The engine records
    /// a total size only while it is still unknown, which by construction
    /// only happens at offset zero, so the two readings never conflict.
    pub content_length: u64,

    /// Blocking reader over the bytes of the range.
    pub reader: Box<dyn Read + Send>,
}

/// A resource that can be read from an arbitrary byte offset.
///
/// `open(offset)` issues a fresh ranged request. Re-opening at the last
/// durably written offset is the whole resume protocol: there is no separate
/// handshake beyond the `Range` header.
pub trait TransferSource: Send + Sync + 'static {
    /// Open the resource for reading, starting at `offset`.
    fn open(&self, offset: u64) -> DownloadResult<SourceStream>;
}

/// HTTP implementation of [`TransferSource`] using ranged GET requests.
#[derive(Debug)]
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    /// Create a source for `url` with the given request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> DownloadResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DownloadError::ClientBuild {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// The URL this source reads from.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl TransferSource for HttpSource {
    fn open(&self, offset: u64) -> DownloadResult<SourceStream> {
        debug!(url = %self.url, offset, "opening ranged request");

        let response = self
            .client
            .get(&self.url)
            .header("Range", format!("bytes={}-", offset))
            .send()
            .map_err(|e| DownloadError::RequestFailed {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::UnexpectedStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        // A plain 200 is fine at offset zero (the range covers the whole
        // resource anyway), but on a resumed request it means the server
        // ignored the Range header and is sending the full body; writing
        // that at the resume offset would corrupt the file.
        if offset > 0 && status != reqwest::StatusCode::PARTIAL_CONTENT {
            return Err(DownloadError::RangeIgnored {
                url: self.url.clone(),
            });
        }

        let content_length = response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| DownloadError::MissingContentLength {
                url: self.url.clone(),
            })?;

        Ok(SourceStream {
            content_length,
            reader: Box::new(response),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_source_exposes_url() {
        let source = HttpSource::new("http://example.com/data.bin", Duration::from_secs(5))
            .expect("client should build");
        assert_eq!(source.url(), "http://example.com/data.bin");
    }

    #[test]
    fn test_open_surfaces_connection_fault() {
        // Port 1 on loopback refuses connections immediately.
        let source = HttpSource::new("http://127.0.0.1:1/data.bin", Duration::from_secs(5))
            .expect("client should build");

        match source.open(0) {
            Err(DownloadError::RequestFailed { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("connection should be refused"),
        }
    }
}
