//! Tracing subscriber setup
//!
//! `RUST_LOG` always wins over the configured level.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Name of the watcher log inside the mailbox
pub const WATCHER_LOG_FILE: &str = "fileclip_watcher.log";

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Requester logging: compact, on stderr, quiet unless asked
pub fn init_stderr(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

/// Watcher logging: appended to a file, no colors
pub fn init_file(path: &Path, level: &str) -> std::io::Result<()> {
    let file: File = OpenOptions::new().create(true).append(true).open(path)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_thread_ids(false)
        .try_init();
    Ok(())
}
