//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, signal handling,
//! logging setup and the requester and watcher runners.

pub mod app;
pub mod args;
pub mod collect;
pub mod config_cmd;
pub mod logging;
#[cfg(unix)]
pub mod pid_file;
pub mod presenter;
pub mod signals;
pub mod watch_app;

// Re-export commonly used types
pub use app::{run_copy, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction, WatchArgs};
pub use presenter::Presenter;
pub use watch_app::run_watch;
