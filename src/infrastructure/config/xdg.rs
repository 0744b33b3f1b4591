//! Config file adapter
//!
//! Settings live in `<config dir>/fileclip/config.toml`. The file is shared
//! by the requester and a long-running watcher, so saves go through a
//! staged temp file and a rename, the same way mailbox artifacts do.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

const APP_DIR: &str = "fileclip";
const CONFIG_FILE: &str = "config.toml";

/// TOML config store under the platform config directory
pub struct XdgConfigStore {
    path: PathBuf,
}

impl XdgConfigStore {
    pub fn new() -> Self {
        Self {
            path: default_config_dir().join(APP_DIR).join(CONFIG_FILE),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn staging_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| CONFIG_FILE.to_string());
        self.path.with_file_name(format!(".{}.tmp", name))
    }
}

impl Default for XdgConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

/// `$XDG_CONFIG_HOME` or the platform equivalent, then `$HOME/.config`
fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"))
}

/// Parse a config file. Blank strings count as unset, matching how empty
/// `FILECLIP_*` variables are treated.
fn parse(content: &str, origin: &Path) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(content)
        .map_err(|e| ConfigError::ParseError(format!("{}: {}", origin.display(), e)))?;

    let blank_to_none = |value: Option<String>| value.filter(|s| !s.trim().is_empty());
    Ok(AppConfig {
        container_workspace: blank_to_none(config.container_workspace),
        host_workspace: blank_to_none(config.host_workspace),
        ping_timeout: blank_to_none(config.ping_timeout),
        watcher_timeout: blank_to_none(config.watcher_timeout),
        log_level: blank_to_none(config.log_level),
        ..config
    })
}

#[async_trait]
impl ConfigStore for XdgConfigStore {
    async fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.exists() {
            return Ok(AppConfig::empty());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", self.path.display(), e)))?;
        parse(&content, &self.path)
    }

    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let write_err = |e: std::io::Error| ConfigError::WriteError(e.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let content =
            toml::to_string_pretty(config).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        let staging = self.staging_path();
        fs::write(&staging, content).await.map_err(write_err)?;
        if let Err(e) = fs::rename(&staging, &self.path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(write_err(e));
        }

        debug!(path = %self.path.display(), "config saved");
        Ok(())
    }

    fn path(&self) -> PathBuf {
        self.path.clone()
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    async fn init(&self) -> Result<(), ConfigError> {
        if self.exists() {
            return Err(ConfigError::AlreadyExists(
                self.path.to_string_lossy().to_string(),
            ));
        }
        self.save(&AppConfig::defaults()).await
    }
}
