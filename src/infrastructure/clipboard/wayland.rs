//! Wayland clipboard adapter using wl-copy

use std::path::PathBuf;

use async_trait::async_trait;

use super::command::{run_tool, uri_list};
use crate::application::ports::{ClipboardError, FileClipboard};

/// Wayland clipboard adapter using wl-copy
pub struct WaylandClipboard;

impl WaylandClipboard {
    /// Create a new Wayland clipboard adapter
    pub fn new() -> Self {
        Self
    }
}

impl Default for WaylandClipboard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileClipboard for WaylandClipboard {
    async fn copy_files(&self, paths: &[PathBuf]) -> Result<(), ClipboardError> {
        let uris = uri_list(paths);
        run_tool("wl-copy", &["--type", "text/uri-list"], Some(uris.as_bytes())).await
    }
}
