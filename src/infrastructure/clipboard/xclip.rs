//! X11 clipboard adapter using xclip

use std::path::PathBuf;

use async_trait::async_trait;

use super::command::{run_tool, uri_list};
use crate::application::ports::{ClipboardError, FileClipboard};

pub struct XclipClipboard;

impl XclipClipboard {
    pub fn new() -> Self {
        Self
    }
}

impl Default for XclipClipboard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileClipboard for XclipClipboard {
    async fn copy_files(&self, paths: &[PathBuf]) -> Result<(), ClipboardError> {
        let uris = uri_list(paths);
        run_tool(
            "xclip",
            &["-selection", "clipboard", "-t", "text/uri-list"],
            Some(uris.as_bytes()),
        )
        .await
    }
}
