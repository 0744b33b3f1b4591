//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::timeout::Timeout;

/// Name of the mailbox directory inside a workspace
pub const MAILBOX_DIR_NAME: &str = ".fileclip";

/// Log levels accepted by `--log-level` and the `log_level` key
pub const VALID_LOG_LEVELS: &[&str] = &["debug", "info", "warn", "error"];

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Workspace root as seen from inside the container
    pub container_workspace: Option<String>,
    /// Same workspace as seen from the host
    pub host_workspace: Option<String>,
    pub use_watcher: Option<bool>,
    pub force_polling: Option<bool>,
    pub ping_timeout: Option<String>,
    pub watcher_timeout: Option<String>,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            container_workspace: None,
            host_workspace: None,
            use_watcher: Some(true),
            force_polling: Some(false),
            ping_timeout: Some(Timeout::default_ping().to_string()),
            watcher_timeout: Some(Timeout::default_result().to_string()),
            log_level: Some("info".to_string()),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            container_workspace: other.container_workspace.or(self.container_workspace),
            host_workspace: other.host_workspace.or(self.host_workspace),
            use_watcher: other.use_watcher.or(self.use_watcher),
            force_polling: other.force_polling.or(self.force_polling),
            ping_timeout: other.ping_timeout.or(self.ping_timeout),
            watcher_timeout: other.watcher_timeout.or(self.watcher_timeout),
            log_level: other.log_level.or(self.log_level),
        }
    }

    /// Container workspace root, or the current directory
    pub fn container_workspace_or_default(&self) -> PathBuf {
        self.container_workspace
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(current_dir)
    }

    /// Host workspace root, or the current directory
    pub fn host_workspace_or_default(&self) -> String {
        self.host_workspace
            .clone()
            .unwrap_or_else(|| current_dir().to_string_lossy().to_string())
    }

    /// Mailbox as seen by the requester
    pub fn container_mailbox(&self) -> PathBuf {
        self.container_workspace_or_default().join(MAILBOX_DIR_NAME)
    }

    /// Mailbox as seen by the watcher
    pub fn host_mailbox(&self) -> PathBuf {
        PathBuf::from(self.host_workspace_or_default()).join(MAILBOX_DIR_NAME)
    }

    pub fn use_watcher_or_default(&self) -> bool {
        self.use_watcher.unwrap_or(true)
    }

    pub fn force_polling_or_default(&self) -> bool {
        self.force_polling.unwrap_or(false)
    }

    /// Ping timeout, or default if not set/invalid
    pub fn ping_timeout_or_default(&self) -> Timeout {
        self.ping_timeout
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Timeout::default_ping)
    }

    /// Result timeout, or default if not set/invalid
    pub fn watcher_timeout_or_default(&self) -> Timeout {
        self.watcher_timeout
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Timeout::default_result)
    }

    /// Log level, or "info" if not set/invalid
    pub fn log_level_or_default(&self) -> &str {
        self.log_level
            .as_deref()
            .filter(|l| VALID_LOG_LEVELS.contains(l))
            .unwrap_or("info")
    }
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
