//! PID file guarding one watcher per mailbox

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use nix::sys::signal::kill;
use nix::unistd::Pid;

/// PID file name inside the mailbox
pub const PID_FILE_NAME: &str = "fileclip_watcher.pid";

/// PID file for the watcher
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// PID file for the watcher serving `mailbox`
    pub fn in_mailbox(mailbox: &Path) -> Self {
        Self::with_path(mailbox.join(PID_FILE_NAME))
    }

    /// Create with custom path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the PID file path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Check if another watcher is already running
    pub fn is_running(&self) -> Option<u32> {
        if !self.path.exists() {
            return None;
        }

        let mut file = File::open(&self.path).ok()?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).ok()?;
        let pid: u32 = contents.trim().parse().ok()?;

        if pid == process::id() {
            return None;
        }

        // Signal 0 probes for existence without delivering anything
        match kill(Pid::from_raw(pid as i32), None) {
            Ok(_) | Err(nix::errno::Errno::EPERM) => Some(pid),
            Err(nix::errno::Errno::ESRCH) => {
                // Stale PID file
                let _ = fs::remove_file(&self.path);
                None
            }
            Err(_) => None,
        }
    }

    /// Acquire the PID file (fails if another watcher is running)
    pub fn acquire(&self) -> Result<(), PidFileError> {
        if let Some(pid) = self.is_running() {
            return Err(PidFileError::AlreadyRunning(pid));
        }

        let mut file = File::create(&self.path).map_err(|e| {
            PidFileError::WriteFailed(format!("Failed to create PID file: {}", e))
        })?;

        write!(file, "{}", process::id())
            .map_err(|e| PidFileError::WriteFailed(format!("Failed to write PID: {}", e)))?;

        Ok(())
    }

    /// Release the PID file
    pub fn release(&self) -> Result<(), PidFileError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PidFileError::RemoveFailed(format!(
                "Failed to remove PID file: {}",
                e
            ))),
        }
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        // Best-effort cleanup, never of another watcher's file
        let ours = fs::read_to_string(&self.path)
            .map(|pid| pid.trim() == process::id().to_string())
            .unwrap_or(false);
        if ours {
            let _ = self.release();
        }
    }
}

/// PID file errors
#[derive(Debug, thiserror::Error)]
pub enum PidFileError {
    #[error("Another watcher is already running (PID: {0})")]
    AlreadyRunning(u32),

    #[error("Failed to write PID file: {0}")]
    WriteFailed(String),

    #[error("Failed to remove PID file: {0}")]
    RemoveFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lives_in_mailbox() {
        let pid_file = PidFile::in_mailbox(Path::new("/work/.fileclip"));
        assert_eq!(
            pid_file.path(),
            &PathBuf::from("/work/.fileclip/fileclip_watcher.pid")
        );
    }

    #[test]
    fn is_running_returns_none_for_nonexistent_file() {
        let tmp = tempfile::tempdir().unwrap();
        let pid_file = PidFile::in_mailbox(tmp.path());
        assert!(pid_file.is_running().is_none());
    }

    #[test]
    fn acquire_writes_own_pid_and_release_removes_it() {
        let tmp = tempfile::tempdir().unwrap();
        let pid_file = PidFile::in_mailbox(tmp.path());

        pid_file.acquire().unwrap();
        let written = fs::read_to_string(pid_file.path()).unwrap();
        assert_eq!(written, process::id().to_string());

        pid_file.release().unwrap();
        assert!(!pid_file.path().exists());
        // Releasing twice is fine
        pid_file.release().unwrap();
    }

    #[test]
    fn live_foreign_pid_blocks_acquire() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(PID_FILE_NAME);
        // PID 1 always exists on unix
        fs::write(&path, "1").unwrap();

        let pid_file = PidFile::with_path(&path);
        assert!(matches!(
            pid_file.acquire(),
            Err(PidFileError::AlreadyRunning(1))
        ));
        drop(pid_file);
        assert!(path.exists());
    }
}
