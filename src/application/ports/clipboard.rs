//! Clipboard port interface

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

/// Clipboard errors
#[derive(Debug, Clone, Error)]
pub enum ClipboardError {
    #[error("{0} not found. Please install it.")]
    ToolNotFound(String),

    #[error("Clipboard unavailable: {0}")]
    ClipboardUnavailable(String),

    #[error("{tool} timed out after {seconds}s")]
    TimedOut { tool: String, seconds: u64 },

    #[error("Failed to copy to clipboard: {0}")]
    CopyFailed(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),
}

/// Port for placing file references on the system clipboard
#[async_trait]
pub trait FileClipboard: Send + Sync {
    /// Copy a batch of files to the clipboard in a single operation.
    ///
    /// # Arguments
    /// * `paths` - Absolute paths of existing files
    ///
    /// # Returns
    /// Ok(()) when the whole batch is on the clipboard, error otherwise
    async fn copy_files(&self, paths: &[PathBuf]) -> Result<(), ClipboardError>;
}

/// Blanket implementation for boxed clipboard types
#[async_trait]
impl FileClipboard for Box<dyn FileClipboard> {
    async fn copy_files(&self, paths: &[PathBuf]) -> Result<(), ClipboardError> {
        self.as_ref().copy_files(paths).await
    }
}
