//! The transfer engine: resumable, controllable HTTP downloads.
//!
//! This module provides the core of the library:
//! - The download lifecycle state machine (`status`)
//! - Shared atomic state between a transfer thread and its controller (`state`)
//! - Ranged access to remote resources (`source`)
//! - The per-download engine owning the background transfer thread (`engine`)
//! - The fault taxonomy (`error`)
//!
//! # Lifecycle
//!
//! ```text
//!            construct
//!                │
//!                ▼
//!          Downloading ──── fault ──────────► Error
//!            │  │  │                            │
//!     pause  │  │  │ end of stream              │ resume
//!            │  │  └──────────► Complete        ▼
//!            ▼  │ cancel                   Downloading
//!          Paused ──────► Cancelled
//!            │
//!            └── resume ──► Downloading (new transfer thread)
//! ```
//!
//! `Complete`, `Cancelled` and `Error` are terminal; `Error` additionally
//! accepts a resume, retrying from the last durably written byte.
//!
//! # Example
//!
//! ```ignore
//! use downlink::{Download, EngineConfig};
//!
//! let config = EngineConfig::default();
//! let download = Download::start("https://example.com/files/data.bin", &config);
//!
//! // Poll observable state on a fixed cadence.
//! println!("{}: {:?}% ({})", download.url(), download.progress(), download.status());
//!
//! download.pause();
//! download.resume(); // continues from the bytes already on disk
//! ```

mod engine;
mod error;
mod source;
mod state;
mod status;

// Public API - consumed by the registry and by front-ends
pub use engine::Download;
pub use error::{DownloadError, DownloadResult};
pub use source::{HttpSource, SourceStream, TransferSource};
pub use status::DownloadStatus;
