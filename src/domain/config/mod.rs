//! Configuration value objects

mod app_config;

pub use app_config::{AppConfig, MAILBOX_DIR_NAME, VALID_LOG_LEVELS};
