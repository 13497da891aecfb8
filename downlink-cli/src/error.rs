//! Error types for the Downlink CLI.

use std::fmt;

/// Errors surfaced to the CLI user.
#[derive(Debug)]
pub enum CliError {
    /// Failed to set up the environment (signal handler, output directory).
    Setup(String),
    /// One or more downloads did not complete.
    Download(String),
    /// The user interrupted the run.
    Interrupted,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup(msg) => write!(f, "setup failed: {msg}"),
            Self::Download(msg) => write!(f, "{msg}"),
            Self::Interrupted => write!(f, "interrupted"),
        }
    }
}

impl std::error::Error for CliError {}
