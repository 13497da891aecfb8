//! Downlink - resumable HTTP download management
//!
//! This library manages independent, resumable HTTP downloads. Each download
//! runs on its own background thread, writes to its own destination file, and
//! can be paused, resumed, cancelled, and queried at any time by a controller
//! that communicates with it purely through a small set of shared atomic
//! fields.
//!
//! # Architecture
//!
//! ```text
//! DownloadRegistry (controller surface)
//!         │
//!         ├── Download (transfer engine, one per target)
//!         │       ├── TransferState (shared atomic status/counters)
//!         │       ├── TransferSource (trait)
//!         │       │       └── HttpSource (ranged GET requests)
//!         │       └── background transfer thread
//!         │
//!         └── DownloadSnapshot (point-in-time view for polling)
//! ```
//!
//! Resumption has no protocol of its own: every transfer, initial or resumed,
//! re-issues a `Range: bytes=<offset>-` request from the number of bytes
//! already written to disk.

pub mod config;
pub mod download;
pub mod registry;

pub use config::EngineConfig;
pub use download::{
    Download, DownloadError, DownloadResult, DownloadStatus, HttpSource, SourceStream,
    TransferSource,
};
pub use registry::{DownloadRegistry, DownloadSnapshot};

/// Library version, taken from the crate metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
