//! macOS clipboard adapter driving Finder through osascript

use std::path::PathBuf;

use async_trait::async_trait;

use super::command::run_tool;
use crate::application::ports::{ClipboardError, FileClipboard};

pub struct OsascriptClipboard;

impl OsascriptClipboard {
    pub fn new() -> Self {
        Self
    }

    /// AppleScript that puts the files on the clipboard as Finder items
    fn script(paths: &[PathBuf]) -> String {
        let files = paths
            .iter()
            .map(|p| {
                let escaped = p.to_string_lossy().replace('\\', "\\\\").replace('"', "\\\"");
                format!("POSIX file \"{}\"", escaped)
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("tell app \"Finder\" to set the clipboard to {{{}}}", files)
    }
}

impl Default for OsascriptClipboard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileClipboard for OsascriptClipboard {
    async fn copy_files(&self, paths: &[PathBuf]) -> Result<(), ClipboardError> {
        let script = Self::script(paths);
        run_tool("osascript", &["-e", &script], None).await
    }
}
