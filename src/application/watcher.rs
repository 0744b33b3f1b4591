//! Watcher use case
//!
//! Runs on the host. Consumes each request artifact once, performs the
//! clipboard operation and answers `copy_files` requests with a result.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::domain::artifact::ArtifactKind;
use crate::domain::message::{Action, RequestMessage, ResultMessage, SenderId};
use crate::domain::observation::ObservationDecision;
use crate::domain::paths::validate_path;
use crate::domain::session::{InvalidStateTransition, WatcherSession, WatcherState};
use crate::infrastructure::mailbox::{Mailbox, MailboxError};
use crate::infrastructure::observer::{Change, MailboxObserver, ObserverError};

use super::ports::FileClipboard;
use super::shutdown::cancelled;

/// Errors from the watcher use case
#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    #[error("Observer error: {0}")]
    Observer(#[from] ObserverError),

    #[error(transparent)]
    InvalidState(#[from] InvalidStateTransition),

    #[error("Observer stopped delivering events")]
    ObserverClosed,
}

/// Configuration for the watcher
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Reject requested paths outside this root
    pub allowed_root: Option<PathBuf>,
    pub poll_interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            allowed_root: None,
            poll_interval: crate::domain::timeout::Timeout::default_poll_interval().as_std(),
        }
    }
}

/// What processing a request artifact amounted to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// A ping was consumed
    PingAnswered,
    /// A copy request was answered with this result
    Completed(ResultMessage),
    /// The artifact could not be parsed and was left for inspection
    Unreadable(String),
    /// Another consumer removed the artifact first
    Vanished,
}

/// Start-up sweep summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub pings_answered: usize,
    pub stale_requests: usize,
}

/// Watcher use case
pub struct WatcherUseCase<C: FileClipboard> {
    mailbox: Mailbox,
    clipboard: C,
    sender: SenderId,
    config: WatcherConfig,
    session: Mutex<WatcherSession>,
}

impl<C: FileClipboard> WatcherUseCase<C> {
    pub fn new(mailbox: Mailbox, clipboard: C, sender: SenderId, config: WatcherConfig) -> Self {
        Self {
            mailbox,
            clipboard,
            sender,
            config,
            session: Mutex::new(WatcherSession::new()),
        }
    }

    pub async fn state(&self) -> WatcherState {
        self.session.lock().await.state()
    }

    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Answer leftover pings and report stale copy requests.
    ///
    /// Copy requests that predate the watcher are not executed: their
    /// requester has already timed out and fallen back.
    pub async fn sweep_stale(&self) -> Result<SweepReport, WatcherError> {
        let mut report = SweepReport::default();
        for (artifact, path) in self.mailbox.pending_requests().await? {
            match self.mailbox.read_request(&path).await {
                Ok(request) if request.action == Action::Ping => {
                    self.mailbox.remove(&path).await?;
                    report.pings_answered += 1;
                }
                Ok(_) => {
                    warn!(request_id = %artifact.request_id, path = %path.display(), "stale copy request left in mailbox");
                    report.stale_requests += 1;
                }
                Err(e) if e.is_not_found() => {}
                Err(e) => warn!(error = %e, "unreadable stale artifact"),
            }
        }
        Ok(report)
    }

    /// Consume one request artifact
    pub async fn process_request(&self, path: &Path) -> Result<ProcessOutcome, WatcherError> {
        info!(path = %path.display(), "Detected new request file");

        let request = match self.mailbox.read_request(path).await {
            Ok(request) => request,
            Err(e) if e.is_not_found() => {
                debug!(path = %path.display(), "request vanished before it was read");
                return Ok(ProcessOutcome::Vanished);
            }
            Err(e) => {
                error!(error = %e, "leaving unreadable request in place");
                return Ok(ProcessOutcome::Unreadable(e.to_string()));
            }
        };
        debug!(request_id = %request.request_id, sender = %request.sender, action = %request.action, "Successfully read JSON");

        match request.action {
            Action::Ping => {
                info!(sender = %request.sender, "Received ping");
                self.mailbox.remove(path).await?;
                Ok(ProcessOutcome::PingAnswered)
            }
            Action::CopyFiles => {
                let result = self.copy(&request).await;
                // Retire the request before publishing the result
                if let Err(e) = self.mailbox.remove(path).await {
                    warn!(error = %e, "failed to remove processed request");
                }
                self.mailbox.write_result(&result).await?;
                info!(request_id = %result.request_id, success = result.success, "{}", result.message);
                Ok(ProcessOutcome::Completed(result))
            }
        }
    }

    /// Observe the mailbox until `shutdown` flips to `true`.
    /// A request already being processed is finished before stopping.
    pub async fn run(
        &self,
        decision: ObservationDecision,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), WatcherError> {
        self.mailbox.ensure().await?;
        let (mut observer, mut events) = MailboxObserver::spawn(
            decision.strategy,
            self.config.poll_interval,
            self.mailbox.dir(),
        )?;
        self.session.lock().await.start()?;
        info!(dir = %self.mailbox.dir().display(), strategy = %decision.strategy, "observing mailbox");

        let outcome = loop {
            tokio::select! {
                _ = cancelled(&mut shutdown) => break Ok(()),
                event = events.recv() => {
                    let Some(event) = event else {
                        break Err(WatcherError::ObserverClosed);
                    };
                    if event.change != Change::Appeared || event.artifact.kind != ArtifactKind::Request {
                        continue;
                    }

                    self.session.lock().await.begin_processing()?;
                    let processed = self.process_request(&event.path).await;
                    self.session.lock().await.finish_processing()?;
                    if let Err(e) = processed {
                        // One failed request must not take the watcher down
                        error!(error = %e, path = %event.path.display(), "request processing failed");
                    }
                }
            }
        };

        observer.stop();
        self.session.lock().await.stop()?;
        info!("watcher stopped");
        outcome
    }

    async fn copy(&self, request: &RequestMessage) -> ResultMessage {
        let mut valid = Vec::new();
        let mut errors = Vec::new();

        for raw in &request.paths {
            let path = PathBuf::from(raw);
            if let Some(root) = &self.config.allowed_root {
                if !validate_path(&path, root) {
                    error!(path = %raw, "path outside allowed root");
                    errors.push(format!("Path outside allowed root: {}", raw));
                    continue;
                }
            }
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => valid.push(path),
                _ => {
                    error!(path = %raw, "Invalid path");
                    errors.push(format!("Invalid or inaccessible path: {}", raw));
                }
            }
        }

        if valid.is_empty() {
            return ResultMessage::failed(
                self.sender.clone(),
                request.request_id,
                "No valid files to copy",
                errors,
            );
        }

        match self.clipboard.copy_files(&valid).await {
            Ok(()) => {
                ResultMessage::copied(self.sender.clone(), request.request_id, valid.len(), errors)
            }
            Err(e) => {
                errors.push(e.to_string());
                ResultMessage::failed(
                    self.sender.clone(),
                    request.request_id,
                    format!("Failed to copy files: {}", e),
                    errors,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ClipboardError;
    use crate::domain::artifact::Artifact;
    use crate::domain::message::RequestId;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex as StdMutex};

    #[derive(Clone, Default)]
    struct RecordingClipboard {
        calls: Arc<StdMutex<Vec<Vec<PathBuf>>>>,
        fail: bool,
    }

    #[async_trait]
    impl FileClipboard for RecordingClipboard {
        async fn copy_files(&self, paths: &[PathBuf]) -> Result<(), ClipboardError> {
            self.calls.lock().unwrap().push(paths.to_vec());
            if self.fail {
                Err(ClipboardError::CopyFailed("xclip exploded".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn watcher(dir: &Path, clipboard: RecordingClipboard) -> WatcherUseCase<RecordingClipboard> {
        WatcherUseCase::new(
            Mailbox::new(dir),
            clipboard,
            SenderId::new("host_pid_9"),
            WatcherConfig::default(),
        )
    }

    fn requester() -> SenderId {
        SenderId::new("box_pid_1")
    }

    #[tokio::test]
    async fn ping_is_deleted_without_result() {
        let tmp = tempfile::tempdir().unwrap();
        let use_case = watcher(tmp.path(), RecordingClipboard::default());
        let path = use_case
            .mailbox()
            .write_request(&RequestMessage::ping(requester()))
            .await
            .unwrap();

        let outcome = use_case.process_request(&path).await.unwrap();

        assert_eq!(outcome, ProcessOutcome::PingAnswered);
        assert!(use_case.mailbox().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn copy_request_yields_result_and_removes_request() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        std::fs::write(&file, "hi").unwrap();
        let clipboard = RecordingClipboard::default();
        let use_case = watcher(&tmp.path().join(".fileclip"), clipboard.clone());
        use_case.mailbox().ensure().await.unwrap();

        let request =
            RequestMessage::copy_files(requester(), vec![file.to_string_lossy().to_string()]);
        let path = use_case.mailbox().write_request(&request).await.unwrap();

        let outcome = use_case.process_request(&path).await.unwrap();

        let ProcessOutcome::Completed(result) = outcome else {
            panic!("expected a result");
        };
        assert!(result.success);
        assert_eq!(result.message, "Copied 1 file(s)");
        assert_eq!(result.request_id, request.request_id);
        assert_eq!(result.sender, SenderId::new("host_pid_9"));
        assert!(!path.exists());
        assert!(use_case
            .mailbox()
            .exists(&Artifact::result(request.request_id))
            .await);
        assert_eq!(clipboard.calls.lock().unwrap().as_slice(), &[vec![file]]);
    }

    #[tokio::test]
    async fn mixed_batch_copies_valid_and_reports_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        std::fs::write(&file, "hi").unwrap();
        let missing = tmp.path().join("missing.txt");
        let clipboard = RecordingClipboard::default();
        let use_case = watcher(tmp.path(), clipboard.clone());

        let request = RequestMessage::copy_files(
            requester(),
            vec![
                file.to_string_lossy().to_string(),
                missing.to_string_lossy().to_string(),
            ],
        );
        let path = use_case.mailbox().write_request(&request).await.unwrap();

        let ProcessOutcome::Completed(result) = use_case.process_request(&path).await.unwrap()
        else {
            panic!("expected a result");
        };

        assert!(result.is_partial());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains(&*missing.to_string_lossy()));
        assert_eq!(clipboard.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn directories_are_not_files() {
        let tmp = tempfile::tempdir().unwrap();
        let clipboard = RecordingClipboard::default();
        let use_case = watcher(tmp.path(), clipboard.clone());
        let request = RequestMessage::copy_files(
            requester(),
            vec![tmp.path().to_string_lossy().to_string()],
        );
        let path = use_case.mailbox().write_request(&request).await.unwrap();

        let ProcessOutcome::Completed(result) = use_case.process_request(&path).await.unwrap()
        else {
            panic!("expected a result");
        };

        assert!(!result.success);
        assert_eq!(result.message, "No valid files to copy");
        assert!(clipboard.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn clipboard_failure_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a.txt");
        std::fs::write(&file, "hi").unwrap();
        let use_case = watcher(
            tmp.path(),
            RecordingClipboard {
                fail: true,
                ..Default::default()
            },
        );
        let request =
            RequestMessage::copy_files(requester(), vec![file.to_string_lossy().to_string()]);
        let path = use_case.mailbox().write_request(&request).await.unwrap();

        let ProcessOutcome::Completed(result) = use_case.process_request(&path).await.unwrap()
        else {
            panic!("expected a result");
        };

        assert!(!result.success);
        assert!(result.message.starts_with("Failed to copy files"));
        assert!(result.errors.iter().any(|e| e.contains("xclip exploded")));
    }

    #[tokio::test]
    async fn paths_outside_allowed_root_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let outside = tempfile::NamedTempFile::new().unwrap();
        let use_case = WatcherUseCase::new(
            Mailbox::new(tmp.path()),
            RecordingClipboard::default(),
            SenderId::new("host_pid_9"),
            WatcherConfig {
                allowed_root: Some(tmp.path().join("workspace")),
                ..Default::default()
            },
        );
        let raw = outside.path().to_string_lossy().to_string();
        let request = RequestMessage::copy_files(requester(), vec![raw.clone()]);
        let path = use_case.mailbox().write_request(&request).await.unwrap();

        let ProcessOutcome::Completed(result) = use_case.process_request(&path).await.unwrap()
        else {
            panic!("expected a result");
        };

        assert!(!result.success);
        assert_eq!(result.errors, vec![format!("Path outside allowed root: {}", raw)]);
    }

    #[tokio::test]
    async fn unparseable_request_is_left_in_place() {
        let tmp = tempfile::tempdir().unwrap();
        let use_case = watcher(tmp.path(), RecordingClipboard::default());
        let path = use_case
            .mailbox()
            .path_of(&Artifact::request(RequestId::new()));
        std::fs::write(&path, b"{\"action\": \"copy_files\"").unwrap();

        let outcome = use_case.process_request(&path).await.unwrap();

        assert!(matches!(outcome, ProcessOutcome::Unreadable(_)));
        assert!(path.exists());
        assert_eq!(use_case.mailbox().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn vanished_request_is_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let use_case = watcher(tmp.path(), RecordingClipboard::default());
        let path = use_case
            .mailbox()
            .path_of(&Artifact::request(RequestId::new()));

        let outcome = use_case.process_request(&path).await.unwrap();
        assert_eq!(outcome, ProcessOutcome::Vanished);
    }

    #[tokio::test]
    async fn sweep_answers_pings_and_keeps_copies() {
        let tmp = tempfile::tempdir().unwrap();
        let use_case = watcher(tmp.path(), RecordingClipboard::default());
        let mailbox = use_case.mailbox();
        mailbox
            .write_request(&RequestMessage::ping(requester()))
            .await
            .unwrap();
        let copy = RequestMessage::copy_files(requester(), vec!["/x".to_string()]);
        mailbox.write_request(&copy).await.unwrap();

        let report = use_case.sweep_stale().await.unwrap();

        assert_eq!(
            report,
            SweepReport {
                pings_answered: 1,
                stale_requests: 1
            }
        );
        let left = mailbox.pending_requests().await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].0, Artifact::request(copy.request_id));
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let tmp = tempfile::tempdir().unwrap();
        let use_case = watcher(tmp.path(), RecordingClipboard::default());
        let (tx, rx) = watch::channel(false);

        let run = use_case.run(ObservationDecision::for_watcher(true), rx);
        let stop = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            tx.send(true).unwrap();
        };
        let (outcome, ()) = tokio::join!(run, stop);

        outcome.unwrap();
        assert_eq!(use_case.state().await, WatcherState::Stopped);
    }
}
