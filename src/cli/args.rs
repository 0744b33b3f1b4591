//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// fileclip - copy files to the host clipboard from inside a container
#[derive(Parser, Debug)]
#[command(name = "fileclip")]
#[command(version)]
#[command(about = "Copy files to the host clipboard from inside a container")]
#[command(long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Files or directories to copy (directories are walked recursively)
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Directory to copy recursively (repeatable)
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    pub dirs: Vec<PathBuf>,

    /// Route the copy through the host watcher
    #[arg(long, overrides_with = "no_watcher")]
    pub use_watcher: bool,

    /// Copy with the local clipboard only
    #[arg(long, overrides_with = "use_watcher")]
    pub no_watcher: bool,

    /// How long to wait for the watcher's result (e.g., 10s, 1m)
    #[arg(long, value_name = "TIME")]
    pub watcher_timeout: Option<String>,

    /// How long to wait for the watcher to answer a ping (e.g., 500ms, 3s)
    #[arg(long, value_name = "TIME")]
    pub ping_timeout: Option<String>,

    /// Poll the mailbox instead of relying on filesystem events
    #[arg(long)]
    pub force_polling: bool,

    /// Workspace root as seen from inside the container
    #[arg(long, value_name = "DIR")]
    pub container_workspace: Option<String>,

    /// Same workspace as seen from the host
    #[arg(long, value_name = "DIR")]
    pub host_workspace: Option<String>,

    /// Log verbosity
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<LogLevelArg>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Tri-state watcher flag: `None` defers to config
    pub fn use_watcher_flag(&self) -> Option<bool> {
        if self.no_watcher {
            Some(false)
        } else if self.use_watcher {
            Some(true)
        } else {
            None
        }
    }
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the host-side watcher that serves clipboard requests
    Watch(WatchArgs),
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options for `fileclip watch`
#[derive(Args, Debug, Clone, Default)]
pub struct WatchArgs {
    /// Poll the mailbox instead of relying on filesystem events
    #[arg(long)]
    pub force_polling: bool,

    /// Host workspace whose mailbox is served
    #[arg(long, value_name = "DIR")]
    pub host_workspace: Option<String>,

    /// Log verbosity
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<LogLevelArg>,
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Log level argument for clap ValueEnum
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevelArg {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevelArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "container_workspace",
    "host_workspace",
    "use_watcher",
    "force_polling",
    "ping_timeout",
    "watcher_timeout",
    "log_level",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
