//! Clipboard infrastructure module
//!
//! Places file references on the system clipboard with each platform's
//! native command-line tooling.

mod command;
mod linux;
mod macos;
mod wayland;
mod windows;
mod xclip;

pub use command::{file_uri, uri_list};
pub use linux::{DisplayEnv, LinuxClipboard};
pub use macos::OsascriptClipboard;
pub use wayland::WaylandClipboard;
pub use windows::PowershellClipboard;
pub use xclip::XclipClipboard;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::application::ports::{ClipboardError, FileClipboard};

/// Create the clipboard adapter for the current platform
pub fn create_clipboard() -> Box<dyn FileClipboard> {
    if cfg!(target_os = "windows") {
        Box::new(PowershellClipboard::new())
    } else if cfg!(target_os = "macos") {
        Box::new(OsascriptClipboard::new())
    } else if cfg!(target_os = "linux") {
        Box::new(LinuxClipboard::new())
    } else {
        Box::new(UnsupportedClipboard)
    }
}

/// Stand-in for platforms without a known clipboard tool
pub struct UnsupportedClipboard;

#[async_trait]
impl FileClipboard for UnsupportedClipboard {
    async fn copy_files(&self, _paths: &[PathBuf]) -> Result<(), ClipboardError> {
        Err(ClipboardError::UnsupportedPlatform(
            std::env::consts::OS.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unsupported_reports_platform() {
        let err = UnsupportedClipboard
            .copy_files(&[PathBuf::from("/a")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains(std::env::consts::OS));
    }
}
