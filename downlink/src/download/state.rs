//! Shared state between a transfer thread and its controller.
//!
//! A transfer thread and any external caller (pause/resume/cancel, progress
//! polling) communicate exclusively through this small set of lock-free
//! atomic fields. There is no message passing and no wide lock: readers
//! observe a consistent triple of status, byte counter and total size at any
//! point during a transfer.

use std::sync::atomic::{AtomicI64, AtomicU64, AtomicU8, Ordering};

use super::status::DownloadStatus;

/// Sentinel for a total size that has not been observed yet.
const SIZE_UNKNOWN: i64 = -1;

/// The mutable fields shared between a transfer thread and its controller.
#[derive(Debug)]
pub(crate) struct TransferState {
    /// Current [`DownloadStatus`], encoded as its discriminant.
    status: AtomicU8,
    /// Bytes durably written to the destination file. Monotonically
    /// non-decreasing; advanced only after the corresponding write returned.
    bytes_transferred: AtomicU64,
    /// Total resource size, or [`SIZE_UNKNOWN`] before the first response.
    total_size: AtomicI64,
}

impl TransferState {
    pub(crate) fn new() -> Self {
        Self {
            status: AtomicU8::new(DownloadStatus::Downloading.as_u8()),
            bytes_transferred: AtomicU64::new(0),
            total_size: AtomicI64::new(SIZE_UNKNOWN),
        }
    }

    pub(crate) fn status(&self) -> DownloadStatus {
        DownloadStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    /// Set the status unconditionally.
    ///
    /// Reserved for fault absorption: a transfer fault moves the download to
    /// `Error` regardless of what an external caller set in the meantime.
    pub(crate) fn set_status(&self, status: DownloadStatus) {
        self.status.store(status.as_u8(), Ordering::SeqCst);
    }

    /// Atomically transition `from` to `to`. Returns whether it applied.
    ///
    /// All regular lifecycle transitions go through this compare-and-swap so
    /// a stale actor can never clobber a newer state: the transfer thread's
    /// natural-completion transition loses against an earlier pause/cancel,
    /// and vice versa.
    pub(crate) fn transition(&self, from: DownloadStatus, to: DownloadStatus) -> bool {
        self.status
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred.load(Ordering::SeqCst)
    }

    /// Advance the byte counter after a chunk has been written.
    pub(crate) fn advance(&self, bytes: u64) {
        self.bytes_transferred.fetch_add(bytes, Ordering::SeqCst);
    }

    pub(crate) fn total_size(&self) -> Option<u64> {
        let raw = self.total_size.load(Ordering::SeqCst);
        if raw < 0 {
            None
        } else {
            Some(raw as u64)
        }
    }

    /// Record the total size on first observation; later calls are ignored.
    ///
    /// The declared content length of a ranged response is the length of the
    /// returned range. The total is only ever unknown before any byte has
    /// been written, where the range starts at offset zero and the declared
    /// length equals the full resource size, so the first observation is the
    /// total size and every later header can be discarded.
    pub(crate) fn set_total_size(&self, size: u64) {
        let clamped = size.min(i64::MAX as u64) as i64;
        let _ = self.total_size.compare_exchange(
            SIZE_UNKNOWN,
            clamped,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    /// Progress in whole percent, or `None` while the total size is unknown
    /// or zero.
    pub(crate) fn progress_percent(&self) -> Option<u8> {
        let total = self.total_size.load(Ordering::SeqCst);
        if total <= 0 {
            return None;
        }
        let total = total as u64;
        let bytes = self.bytes_transferred().min(total);
        // Widened so the multiply cannot overflow for very large resources.
        Some((bytes as u128 * 100 / total as u128) as u8)
    }
}
