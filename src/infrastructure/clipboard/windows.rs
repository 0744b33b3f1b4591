//! Windows clipboard adapter using PowerShell's Set-Clipboard

use std::path::PathBuf;

use async_trait::async_trait;

use super::command::run_tool;
use crate::application::ports::{ClipboardError, FileClipboard};

pub struct PowershellClipboard;

impl PowershellClipboard {
    pub fn new() -> Self {
        Self
    }

    fn command(paths: &[PathBuf]) -> String {
        let list = paths
            .iter()
            .map(|p| format!("'{}'", p.to_string_lossy().replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(",");
        format!("Set-Clipboard -Path {}", list)
    }
}

impl Default for PowershellClipboard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileClipboard for PowershellClipboard {
    async fn copy_files(&self, paths: &[PathBuf]) -> Result<(), ClipboardError> {
        let command = Self::command(paths);
        run_tool(
            "powershell.exe",
            &["-NoProfile", "-NonInteractive", "-Command", &command],
            None,
        )
        .await
    }
}
