//! CLI command implementations.

pub mod get;
