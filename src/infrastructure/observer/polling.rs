//! Interval polling of the mailbox listing
//!
//! Works on mounts that never deliver native events (cross-VM and
//! container bind mounts), at the cost of a latency floor of one interval.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{Change, EventSender, MailboxEvent, ObserverError};
use crate::domain::artifact::Artifact;

/// Observer that diffs directory listings on a fixed interval
pub struct PollingObserver {
    interval: Duration,
    stop_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl PollingObserver {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            stop_tx: None,
            task: None,
        }
    }

    /// Take a baseline listing now, then diff against it from a background task.
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, dir: &Path, events: EventSender) -> Result<(), ObserverError> {
        if self.task.is_some() {
            return Err(ObserverError::AlreadyStarted);
        }

        let baseline = snapshot(dir).map_err(|source| ObserverError::Listing {
            path: dir.to_path_buf(),
            source,
        })?;

        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(poll_loop(
            dir.to_path_buf(),
            self.interval,
            baseline,
            events,
            stop_rx,
        ));

        debug!(dir = %dir.display(), interval_ms = self.interval.as_millis() as u64, "polling observer started");
        self.stop_tx = Some(stop_tx);
        self.task = Some(task);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(true);
        }
        if self.task.take().is_some() {
            debug!("polling observer stopped");
        }
    }
}

async fn poll_loop(
    dir: PathBuf,
    period: Duration,
    mut known: HashSet<PathBuf>,
    events: EventSender,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick fires immediately; the baseline already covers it
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = stop_rx.changed() => break,
        }

        let current = match snapshot(&dir) {
            Ok(current) => current,
            Err(err) => {
                warn!(dir = %dir.display(), %err, "mailbox listing failed");
                continue;
            }
        };

        let appeared = current.difference(&known).cloned();
        let vanished = known.difference(&current).cloned();
        let batch: Vec<MailboxEvent> = appeared
            .filter_map(|p| MailboxEvent::for_path(Change::Appeared, p))
            .chain(vanished.filter_map(|p| MailboxEvent::for_path(Change::Vanished, p)))
            .collect();

        for event in batch {
            if events.send(event).is_err() {
                return;
            }
        }
        known = current;
    }
}

/// Paths of all classified artifacts in `dir`
fn snapshot(dir: &Path) -> std::io::Result<HashSet<PathBuf>> {
    let mut paths = HashSet::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if Artifact::classify_path(&path).is_some() {
            paths.insert(path);
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::message::RequestId;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    const INTERVAL: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn reports_appear_and_vanish() {
        let tmp = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut observer = PollingObserver::new(INTERVAL);
        observer.start(tmp.path(), tx).unwrap();

        let artifact = Artifact::request(RequestId::new());
        let path = tmp.path().join(artifact.file_name());
        std::fs::write(&path, b"{}").unwrap();

        let event = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        assert_eq!(event.change, Change::Appeared);
        assert_eq!(event.artifact, artifact);

        std::fs::remove_file(&path).unwrap();
        let event = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        assert_eq!(event.change, Change::Vanished);

        observer.stop();
    }

    #[tokio::test]
    async fn preexisting_artifacts_are_baseline() {
        let tmp = tempfile::tempdir().unwrap();
        let artifact = Artifact::request(RequestId::new());
        std::fs::write(tmp.path().join(artifact.file_name()), b"{}").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut observer = PollingObserver::new(INTERVAL);
        observer.start(tmp.path(), tx).unwrap();

        assert!(timeout(INTERVAL * 5, rx.recv()).await.is_err());
        observer.stop();
    }

    #[tokio::test]
    async fn missing_directory_fails_to_start() {
        let tmp = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut observer = PollingObserver::new(INTERVAL);
        let err = observer.start(&tmp.path().join("absent"), tx).unwrap_err();
        assert!(matches!(err, ObserverError::Listing { .. }));
    }

    #[tokio::test]
    async fn stop_ends_the_stream() {
        let tmp = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut observer = PollingObserver::new(INTERVAL);
        observer.start(tmp.path(), tx).unwrap();
        observer.stop();

        // The task drops its sender once it notices the stop signal
        let closed = timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
        assert!(closed.is_none());
    }
}
