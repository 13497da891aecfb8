//! Get command - download URLs and poll progress until done.
//!
//! The command is a straight consumer of the registry's polling contract:
//! it reads a snapshot of every download on the configured cadence, prints
//! a row whenever one changes, and exits when everything is terminal.
//! Ctrl-C cancels the remaining transfers and waits for their threads.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use downlink::{DownloadRegistry, DownloadSnapshot, DownloadStatus, EngineConfig};
use tracing::debug;

use crate::error::CliError;

/// Arguments for the get command.
pub struct GetArgs {
    pub urls: Vec<String>,
    pub output_dir: PathBuf,
    pub timeout: u64,
}

/// Run the get command.
pub fn run(args: GetArgs) -> Result<(), CliError> {
    std::fs::create_dir_all(&args.output_dir)
        .map_err(|e| CliError::Setup(format!("cannot create output directory: {e}")))?;

    let config = EngineConfig::new(args.output_dir)
        .with_timeout(Duration::from_secs(args.timeout));
    let poll_interval = config.poll_interval;

    let registry = Arc::new(DownloadRegistry::new(config));

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst))
            .map_err(|e| CliError::Setup(format!("cannot install Ctrl-C handler: {e}")))?;
    }

    for url in &args.urls {
        debug!(url = %url, "adding download");
        registry.add(url.clone());
    }

    // Poll-and-render loop: snapshots are the only view into the engines.
    let mut rendered: Vec<String> = Vec::new();
    let was_interrupted = loop {
        render_changes(&registry.snapshot(), &mut rendered);

        if registry.all_terminal() {
            break false;
        }
        if interrupted.load(Ordering::SeqCst) {
            eprintln!("interrupted, cancelling active downloads");
            registry.shutdown();
            render_changes(&registry.snapshot(), &mut rendered);
            break true;
        }
        thread::sleep(poll_interval);
    };

    if was_interrupted {
        return Err(CliError::Interrupted);
    }

    let snapshots = registry.snapshot();
    let failed = snapshots
        .iter()
        .filter(|s| s.status == DownloadStatus::Error)
        .count();
    if failed > 0 {
        return Err(CliError::Download(format!(
            "{failed} of {} downloads failed",
            snapshots.len()
        )));
    }
    Ok(())
}

/// Print a row for every download whose rendered view changed.
fn render_changes(snapshots: &[DownloadSnapshot], rendered: &mut Vec<String>) {
    rendered.resize(snapshots.len(), String::new());
    for (snapshot, seen) in snapshots.iter().zip(rendered.iter_mut()) {
        let row = format_row(snapshot);
        if row != *seen {
            println!("{row}");
            *seen = row;
        }
    }
}

/// One display row: url, size, progress, status.
fn format_row(snapshot: &DownloadSnapshot) -> String {
    let size = snapshot
        .size
        .map(|bytes| bytes.to_string())
        .unwrap_or_else(|| "?".to_string());
    let progress = snapshot
        .progress
        .map(|percent| format!("{percent}%"))
        .unwrap_or_else(|| "?".to_string());

    match &snapshot.error {
        Some(error) => format!(
            "{}  {}  {}  {} ({})",
            snapshot.url, size, progress, snapshot.status, error
        ),
        None => format!(
            "{}  {}  {}  {}",
            snapshot.url, size, progress, snapshot.status
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(status: DownloadStatus) -> DownloadSnapshot {
        DownloadSnapshot {
            url: "http://example.com/data.bin".to_string(),
            file_name: "data.bin".to_string(),
            size: Some(5000),
            bytes_transferred: 1024,
            progress: Some(20),
            status,
            error: None,
        }
    }

    #[test]
    fn test_format_row() {
        let row = format_row(&snapshot(DownloadStatus::Downloading));
        assert_eq!(row, "http://example.com/data.bin  5000  20%  Downloading");
    }

    #[test]
    fn test_format_row_unknown_size() {
        let mut s = snapshot(DownloadStatus::Downloading);
        s.size = None;
        s.progress = None;
        let row = format_row(&s);
        assert_eq!(row, "http://example.com/data.bin  ?  ?  Downloading");
    }

    #[test]
    fn test_format_row_with_error() {
        let mut s = snapshot(DownloadStatus::Error);
        s.error = Some("request failed".to_string());
        let row = format_row(&s);
        assert!(row.ends_with("Error (request failed)"));
    }

    #[test]
    fn test_render_changes_prints_only_on_change() {
        let snapshots = vec![snapshot(DownloadStatus::Downloading)];
        let mut rendered = Vec::new();

        render_changes(&snapshots, &mut rendered);
        assert_eq!(rendered.len(), 1);
        let first = rendered[0].clone();

        // Unchanged snapshot leaves the rendered row alone.
        render_changes(&snapshots, &mut rendered);
        assert_eq!(rendered[0], first);

        let snapshots = vec![snapshot(DownloadStatus::Paused)];
        render_changes(&snapshots, &mut rendered);
        assert_ne!(rendered[0], first);
    }
}
