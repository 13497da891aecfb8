//! Download lifecycle states and controller action gating.

use std::fmt;

/// Status of a single download.
///
/// A download starts in `Downloading` and moves through the lifecycle via
/// external pause/resume/cancel calls or by the transfer thread finishing
/// naturally or faulting. Every non-`Downloading` state stops the running
/// transfer thread at its next loop check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DownloadStatus {
    /// A background transfer thread is active (or about to start).
    Downloading = 0,
    /// Suspended by the controller; resumable from the current offset.
    Paused = 1,
    /// All expected bytes were received and written.
    Complete = 2,
    /// Cancelled by the controller; the partial file is left on disk.
    Cancelled = 3,
    /// A transfer fault was absorbed at the thread boundary.
    Error = 4,
}

impl DownloadStatus {
    /// Stable display label for this state.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Downloading => "Downloading",
            Self::Paused => "Paused",
            Self::Complete => "Complete",
            Self::Cancelled => "Cancelled",
            Self::Error => "Error",
        }
    }

    /// Whether no further transfer activity occurs without an explicit resume.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Cancelled | Self::Error)
    }

    /// Whether a controller should offer the pause action.
    pub fn can_pause(&self) -> bool {
        matches!(self, Self::Downloading)
    }

    /// Whether a controller should offer the resume action.
    ///
    /// Resume from `Error` retries from the last durably written byte.
    pub fn can_resume(&self) -> bool {
        matches!(self, Self::Paused | Self::Error)
    }

    /// Whether a controller should offer the cancel action.
    pub fn can_cancel(&self) -> bool {
        matches!(self, Self::Downloading | Self::Paused)
    }

    /// Whether the download may be removed from a registry.
    ///
    /// Active or paused downloads are never removed.
    pub fn can_clear(&self) -> bool {
        self.is_terminal()
    }

    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Downloading,
            1 => Self::Paused,
            2 => Self::Complete,
            3 => Self::Cancelled,
            _ => Self::Error,
        }
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
