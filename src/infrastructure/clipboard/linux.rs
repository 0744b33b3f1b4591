//! Linux clipboard selection
//!
//! Prefers wl-copy under Wayland and falls back to xclip when wl-copy is
//! missing or hangs; uses xclip directly under X11.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::warn;

use super::command::uri_list;
use super::{WaylandClipboard, XclipClipboard};
use crate::application::ports::{ClipboardError, FileClipboard};

/// Display servers visible to this process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayEnv {
    pub wayland: bool,
    pub x11: bool,
}

impl DisplayEnv {
    pub fn detect() -> Self {
        let set = |key: &str| std::env::var_os(key).map(|v| !v.is_empty()).unwrap_or(false);
        Self {
            wayland: set("WAYLAND_DISPLAY"),
            x11: set("DISPLAY"),
        }
    }
}

pub struct LinuxClipboard {
    display: DisplayEnv,
    wayland: WaylandClipboard,
    xclip: XclipClipboard,
}

impl LinuxClipboard {
    pub fn new() -> Self {
        Self::with_display(DisplayEnv::detect())
    }

    pub fn with_display(display: DisplayEnv) -> Self {
        Self {
            display,
            wayland: WaylandClipboard::new(),
            xclip: XclipClipboard::new(),
        }
    }
}

impl Default for LinuxClipboard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileClipboard for LinuxClipboard {
    async fn copy_files(&self, paths: &[PathBuf]) -> Result<(), ClipboardError> {
        if self.display.wayland {
            match self.wayland.copy_files(paths).await {
                Ok(()) => return Ok(()),
                Err(e @ (ClipboardError::ToolNotFound(_) | ClipboardError::TimedOut { .. })) => {
                    warn!(error = %e, "wl-copy unusable, trying xclip");
                }
                Err(e) => return Err(e),
            }
        }

        if self.display.x11 {
            return self.xclip.copy_files(paths).await;
        }

        Err(ClipboardError::ClipboardUnavailable(format!(
            "No functional display server detected. File URIs (copy manually):\n{}",
            uri_list(paths)
        )))
    }
}
