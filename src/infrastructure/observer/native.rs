//! Native filesystem notifications via `notify`

use std::path::{Path, PathBuf};

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use super::{Change, EventSender, MailboxEvent, ObserverError};

/// Observer backed by the platform's recommended notify watcher
pub struct NativeObserver {
    watcher: Option<RecommendedWatcher>,
    dir: Option<PathBuf>,
}

impl NativeObserver {
    pub fn new() -> Self {
        Self {
            watcher: None,
            dir: None,
        }
    }

    pub fn start(&mut self, dir: &Path, events: EventSender) -> Result<(), ObserverError> {
        if self.watcher.is_some() {
            return Err(ObserverError::AlreadyStarted);
        }

        let native_err = |source| ObserverError::Native {
            path: dir.to_path_buf(),
            source,
        };

        let mut watcher = notify::recommended_watcher(
            move |res: Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    for mailbox_event in translate(event) {
                        let _ = events.send(mailbox_event);
                    }
                }
                Err(err) => warn!(%err, "native watcher error"),
            },
        )
        .map_err(native_err)?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(native_err)?;

        debug!(dir = %dir.display(), "native observer started");
        self.watcher = Some(watcher);
        self.dir = Some(dir.to_path_buf());
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            if let Some(dir) = self.dir.take() {
                let _ = watcher.unwatch(&dir);
            }
            debug!("native observer stopped");
        }
    }
}

impl Default for NativeObserver {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a raw notify event onto mailbox events.
/// Renames and writes are resolved by checking whether the path still exists.
fn translate(event: notify::Event) -> Vec<MailboxEvent> {
    let resolve = |path: &PathBuf| match event.kind {
        EventKind::Remove(_) => Change::Vanished,
        _ if path.exists() => Change::Appeared,
        _ => Change::Vanished,
    };

    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => event
            .paths
            .iter()
            .filter_map(|p| MailboxEvent::for_path(resolve(p), p.clone()))
            .collect(),
        _ => Vec::new(),
    }
}
