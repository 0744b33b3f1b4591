//! Shared helpers for command-line clipboard tools

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::application::ports::ClipboardError;

/// Upper bound for any clipboard tool invocation
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Bytes left as-is in a `file://` path
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Run a clipboard tool, optionally feeding `input` on stdin.
/// A missing binary maps to [`ClipboardError::ToolNotFound`].
///
/// Only the tool's own exit is awaited. `wl-copy` and `xclip` leave a forked
/// child serving the selection, so no output pipe is held open.
pub async fn run_tool(program: &str, args: &[&str], input: Option<&[u8]>) -> Result<(), ClipboardError> {
    debug!(program, ?args, "running clipboard tool");

    let mut child = Command::new(program)
        .args(args)
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ClipboardError::ToolNotFound(program.to_string())
            } else {
                ClipboardError::CopyFailed(e.to_string())
            }
        })?;

    if let (Some(data), Some(mut stdin)) = (input, child.stdin.take()) {
        stdin
            .write_all(data)
            .await
            .map_err(|e| ClipboardError::CopyFailed(e.to_string()))?;
        // Close stdin so the tool sees EOF
        drop(stdin);
    }

    let status = timeout(COMMAND_TIMEOUT, child.wait())
        .await
        .map_err(|_| ClipboardError::TimedOut {
            tool: program.to_string(),
            seconds: COMMAND_TIMEOUT.as_secs(),
        })?
        .map_err(|e| ClipboardError::CopyFailed(e.to_string()))?;

    if !status.success() {
        return Err(ClipboardError::CopyFailed(format!(
            "{} exited with status: {}",
            program, status
        )));
    }

    Ok(())
}

/// `text/uri-list` payload for a batch of files, without a trailing newline
pub fn uri_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| file_uri(&p.to_string_lossy()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `file://` URI with reserved bytes percent-encoded
pub fn file_uri(path: &str) -> String {
    format!("file://{}", utf8_percent_encode(path, PATH_ENCODE_SET))
}
