//! Expand command-line selections into a flat list of files

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::domain::error::PathError;

/// Collect absolute file paths from positional arguments and `--dir` values.
///
/// Directories are walked recursively in name order. Anything that does not
/// exist is an error.
pub fn collect_files(files: &[PathBuf], dirs: &[PathBuf]) -> Result<Vec<PathBuf>, PathError> {
    let mut collected = Vec::new();
    for item in files.iter().chain(dirs) {
        let path = absolutize(item);
        if path.is_dir() {
            for entry in WalkDir::new(&path).follow_links(true).sort_by_file_name() {
                let entry =
                    entry.map_err(|_| PathError::NotFound(item.display().to_string()))?;
                if !entry.file_type().is_dir() {
                    collected.push(entry.into_path());
                }
            }
        } else if path.exists() {
            collected.push(path);
        } else {
            return Err(PathError::NotFound(item.display().to_string()));
        }
    }
    Ok(collected)
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}
