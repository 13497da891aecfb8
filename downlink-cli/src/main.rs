//! Downlink CLI - resumable HTTP downloads from the command line.
//!
//! This binary is a thin front-end over the `downlink` library: it parses
//! arguments, initializes logging, and drives a download registry through
//! its polling contract.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::get::{self, GetArgs};
use error::CliError;

#[derive(Parser)]
#[command(
    name = "downlink",
    version,
    about = "Resumable HTTP downloads with pause, resume and cancel"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download one or more URLs.
    Get {
        /// URLs to download.
        #[arg(required = true)]
        urls: Vec<String>,

        /// Directory to write downloaded files into.
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// HTTP request timeout in seconds.
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Get {
            urls,
            output_dir,
            timeout,
        } => get::run(GetArgs {
            urls,
            output_dir,
            timeout,
        }),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
