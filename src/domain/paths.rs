//! Container/host path mapping

use std::path::{Component, Path, PathBuf};

use crate::domain::error::PathError;

/// Markers whose presence means we run inside a container
const CONTAINER_MARKERS: &[&str] = &["/.dockerenv", "/vscode"];

/// Environment variable set by dev container tooling
pub const DEV_CONTAINER_ENV: &str = "DEV_CONTAINER";

/// Detect whether this process runs inside a container
pub fn is_container() -> bool {
    if CONTAINER_MARKERS.iter().any(|m| Path::new(m).exists()) {
        return true;
    }
    std::env::var_os(DEV_CONTAINER_ENV).is_some()
}

/// Check that `path` lies under `root` (component-wise, no `..` escapes)
pub fn validate_path(path: &Path, root: &Path) -> bool {
    let path = normalize(path);
    let root = normalize(root);
    path.starts_with(&root)
}

/// Translate a container path into the equivalent host path.
///
/// The remainder after `container_root` is joined onto `host_root` using the
/// separator style of the host root, so Windows hosts get backslashes.
pub fn translate_path(path: &Path, container_root: &Path, host_root: &str) -> Result<String, PathError> {
    let normalized = normalize(path);
    let root = normalize(container_root);

    let relative = normalized
        .strip_prefix(&root)
        .map_err(|_| PathError::OutsideRoot {
            path: path.display().to_string(),
            root: container_root.display().to_string(),
        })?;

    let separator = host_separator(host_root);
    let mut host = host_root.trim_end_matches(['/', '\\']).to_string();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            host.push(separator);
            host.push_str(&part.to_string_lossy());
        }
    }
    Ok(host)
}

fn host_separator(host_root: &str) -> char {
    let looks_windows = host_root.contains('\\')
        || host_root
            .as_bytes()
            .get(1)
            .map(|b| *b == b':')
            .unwrap_or(false);
    if looks_windows {
        '\\'
    } else {
        '/'
    }
}

/// Lexically resolve `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
