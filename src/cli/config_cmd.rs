//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::{AppConfig, VALID_LOG_LEVELS};
use crate::domain::error::ConfigError;
use crate::domain::timeout::Timeout;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let mut config = store.load().await?;
    apply(&mut config, key, value)?;
    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));
    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;
    let config = store.load().await?;

    match lookup(&config, key) {
        Some(v) => presenter.output(&v),
        None => presenter.output("(not set)"),
    }
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;
    for key in VALID_CONFIG_KEYS {
        let value = lookup(&config, key).unwrap_or_else(|| "(not set)".to_string());
        presenter.key_value(key, &value);
    }
    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            key: key.to_string(),
            message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        })
    }
}

/// Validate `value` and store it under `key`
fn apply(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::ValidationError {
        key: key.to_string(),
        message,
    };
    let boolean = || {
        parse_bool(value).map_err(|_| invalid("Value must be 'true' or 'false'".to_string()))
    };
    let timeout = || {
        value
            .parse::<Timeout>()
            .map(|t| t.to_string())
            .map_err(|e| invalid(e.to_string()))
    };

    match key {
        "container_workspace" => config.container_workspace = Some(value.to_string()),
        "host_workspace" => config.host_workspace = Some(value.to_string()),
        "use_watcher" => config.use_watcher = Some(boolean()?),
        "force_polling" => config.force_polling = Some(boolean()?),
        "ping_timeout" => config.ping_timeout = Some(timeout()?),
        "watcher_timeout" => config.watcher_timeout = Some(timeout()?),
        "log_level" => {
            let lower = value.to_lowercase();
            if !VALID_LOG_LEVELS.contains(&lower.as_str()) {
                return Err(invalid(format!(
                    "Invalid value '{}'. Valid options: {}",
                    value,
                    VALID_LOG_LEVELS.join(", ")
                )));
            }
            config.log_level = Some(lower);
        }
        _ => return Err(invalid("Unknown key".to_string())),
    }
    Ok(())
}

fn lookup(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "container_workspace" => config.container_workspace.clone(),
        "host_workspace" => config.host_workspace.clone(),
        "use_watcher" => config.use_watcher.map(|b| b.to_string()),
        "force_polling" => config.force_polling.map(|b| b.to_string()),
        "ping_timeout" => config.ping_timeout.clone(),
        "watcher_timeout" => config.watcher_timeout.clone(),
        "log_level" => config.log_level.clone(),
        _ => None,
    }
}

/// Parse a boolean value
pub(crate) fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(()),
    }
}
