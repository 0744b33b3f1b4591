//! Mailbox message model
//!
//! Requests travel from the requester to the watcher, results travel back.
//! Both are serialized as JSON and paired by their `request_id`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation id pairing a request with its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Mint a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identity of a participating process, used for log correlation only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenderId(String);

impl SenderId {
    /// Wrap an explicit identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the identity of the current process: `<host>_pid_<pid>`
    pub fn current() -> Self {
        Self(format!("{}_pid_{}", hostname(), std::process::id()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(unix)]
fn hostname() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(not(unix))]
fn hostname() -> String {
    std::env::var("COMPUTERNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Request actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    CopyFiles,
    Ping,
}

impl Action {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CopyFiles => "copy_files",
            Self::Ping => "ping",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request written by the requester and consumed once by the watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMessage {
    pub action: Action,
    pub sender: SenderId,
    pub request_id: RequestId,
    /// Host-side absolute paths; empty for pings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
}

impl RequestMessage {
    /// Build a copy request with a fresh id
    pub fn copy_files(sender: SenderId, paths: Vec<String>) -> Self {
        Self {
            action: Action::CopyFiles,
            sender,
            request_id: RequestId::new(),
            paths,
        }
    }

    /// Build a liveness ping with a fresh id
    pub fn ping(sender: SenderId) -> Self {
        Self {
            action: Action::Ping,
            sender,
            request_id: RequestId::new(),
            paths: Vec::new(),
        }
    }
}

/// A result written by the watcher and consumed once by the requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultMessage {
    /// The watcher's identity
    pub sender: SenderId,
    pub request_id: RequestId,
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ResultMessage {
    /// Result for a batch where `count` files reached the clipboard
    pub fn copied(sender: SenderId, request_id: RequestId, count: usize, errors: Vec<String>) -> Self {
        Self {
            sender,
            request_id,
            success: true,
            message: format!("Copied {} file(s)", count),
            errors,
        }
    }

    /// Failed result with a summary and per-item detail
    pub fn failed(
        sender: SenderId,
        request_id: RequestId,
        message: impl Into<String>,
        errors: Vec<String>,
    ) -> Self {
        Self {
            sender,
            request_id,
            success: false,
            message: message.into(),
            errors,
        }
    }

    /// Succeeded, but some paths were rejected
    pub fn is_partial(&self) -> bool {
        self.success && !self.errors.is_empty()
    }
}
