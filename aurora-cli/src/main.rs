//! Binary crate for the `aurora` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - The full-screen dashboard and its tabs

use std::{
    fs::{self, File, OpenOptions},
    sync::Mutex,
};

use aurora_core::Config;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod tui;
mod view;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    init_tracing(cmd.verbose, cmd.command.is_interactive());
    cmd.run().await
}

/// Logs go to stderr, or to the log file while the dashboard draws on the terminal.
/// `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8, interactive: bool) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    if !interactive {
        subscriber.with_writer(std::io::stderr).init();
        return;
    }
    match open_log_file() {
        Some(file) => subscriber.with_ansi(false).with_writer(Mutex::new(file)).init(),
        None => subscriber.with_writer(std::io::sink).init(),
    }
}

fn open_log_file() -> Option<File> {
    let path = Config::log_file_path().ok()?;
    fs::create_dir_all(path.parent()?).ok()?;
    OpenOptions::new().create(true).append(true).open(path).ok()
}
