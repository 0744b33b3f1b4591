//! Copy request use case
//!
//! Runs in the container. Issues a `copy_files` request, waits for the
//! matching result and falls back to the local clipboard when no watcher
//! answers in time. Every call ends in exactly one verdict.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::artifact::{Artifact, ArtifactKind};
use crate::domain::message::{RequestId, RequestMessage, ResultMessage, SenderId};
use crate::domain::observation::ObservationDecision;
use crate::domain::session::{InvalidStateTransition, RequestSession, RequestState};
use crate::domain::timeout::Timeout;
use crate::infrastructure::mailbox::{Mailbox, MailboxError};
use crate::infrastructure::observer::{Change, MailboxObserver};

use super::ports::FileClipboard;
use super::probe::LivenessProbe;
use super::shutdown::cancelled;
use super::strategy::select_strategy;

/// Errors from the copy request use case
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Request cancelled")]
    Cancelled,

    #[error(transparent)]
    InvalidState(#[from] InvalidStateTransition),
}

/// Requester configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub force_polling: bool,
    pub ping_timeout: Timeout,
    pub result_timeout: Timeout,
    pub poll_interval: Duration,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            force_polling: false,
            ping_timeout: Timeout::default_ping(),
            result_timeout: Timeout::default_result(),
            poll_interval: Timeout::default_poll_interval().as_std(),
        }
    }
}

/// The same selection seen from both sides of the mount
#[derive(Debug, Clone, Default)]
pub struct CopyInput {
    /// Paths as the watcher sees them
    pub host_paths: Vec<String>,
    /// Paths as this process sees them, used for the local fallback
    pub local_paths: Vec<PathBuf>,
}

/// How the verdict was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyRoute {
    /// The watcher answered
    Watcher,
    /// The watcher was unreachable; copied locally instead
    LocalFallback,
    /// The watcher was never involved
    Local,
}

/// Final verdict of one copy call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyReport {
    pub route: CopyRoute,
    pub success: bool,
    pub message: String,
    pub errors: Vec<String>,
    /// Why the watcher route was abandoned
    pub fallback_reason: Option<String>,
}

impl CopyReport {
    fn from_result(result: ResultMessage) -> Self {
        Self {
            route: CopyRoute::Watcher,
            success: result.success,
            message: result.message,
            errors: result.errors,
            fallback_reason: None,
        }
    }

    /// Succeeded, but some paths were rejected
    pub fn is_partial(&self) -> bool {
        self.success && !self.errors.is_empty()
    }
}

/// Copy directly with the local clipboard
pub async fn copy_locally<C: FileClipboard + ?Sized>(
    clipboard: &C,
    paths: &[PathBuf],
) -> CopyReport {
    let (success, message, errors) = if paths.is_empty() {
        (false, "No valid files to copy".to_string(), Vec::new())
    } else {
        match clipboard.copy_files(paths).await {
            Ok(()) => (true, format!("Copied {} file(s)", paths.len()), Vec::new()),
            Err(e) => (false, format!("Failed to copy files: {}", e), vec![e.to_string()]),
        }
    };

    CopyReport {
        route: CopyRoute::Local,
        success,
        message,
        errors,
        fallback_reason: None,
    }
}

/// Copy request use case
pub struct CopyRequestUseCase<C: FileClipboard> {
    mailbox: Mailbox,
    clipboard: C,
    sender: SenderId,
    config: RequestConfig,
    session: RequestSession,
    decision: Option<ObservationDecision>,
}

impl<C: FileClipboard> CopyRequestUseCase<C> {
    pub fn new(mailbox: Mailbox, clipboard: C, sender: SenderId, config: RequestConfig) -> Self {
        Self {
            mailbox,
            clipboard,
            sender,
            config,
            session: RequestSession::new(),
            decision: None,
        }
    }

    /// Start from an already resolved decision; no probe will run
    pub fn with_decision(mut self, decision: ObservationDecision) -> Self {
        self.decision = Some(decision);
        self
    }

    pub fn decision(&self) -> Option<ObservationDecision> {
        self.decision
    }

    pub fn state(&self) -> RequestState {
        self.session.state()
    }

    /// Resolve the observation strategy. Probes at most once per instance.
    ///
    /// Cancelling mid-probe leaves the decision unresolved; the ping stays
    /// behind for a watcher to clean up.
    pub async fn connect(
        &mut self,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<ObservationDecision, RequestError> {
        if let Some(decision) = self.decision {
            return Ok(decision);
        }

        self.session.begin_probe()?;
        let probe = LivenessProbe::new(
            self.mailbox.clone(),
            self.sender.clone(),
            self.config.poll_interval,
        );
        let decision = tokio::select! {
            biased;
            _ = cancelled(cancel) => None,
            decision = select_strategy(&probe, self.config.force_polling, self.config.ping_timeout) => Some(decision),
        };
        self.session.finish_probe()?;

        let Some(decision) = decision else {
            info!("probe cancelled");
            return Err(RequestError::Cancelled);
        };
        self.decision = Some(decision);
        Ok(decision)
    }

    /// Send one copy request and wait for its verdict.
    ///
    /// Flipping `cancel` to `true` removes the pending request and returns
    /// [`RequestError::Cancelled`].
    pub async fn execute(
        &mut self,
        input: CopyInput,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<CopyReport, RequestError> {
        let decision = self.connect(cancel).await?;
        self.session.await_result()?;

        let request = RequestMessage::copy_files(self.sender.clone(), input.host_paths);
        let outcome = tokio::select! {
            _ = cancelled(cancel) => Err(RequestError::Cancelled),
            waited = self.exchange(decision, &request) => Ok(waited),
        };

        let waited = match outcome {
            Ok(waited) => waited,
            Err(e) => {
                self.discard_request(request.request_id).await;
                self.session.complete()?;
                info!(request_id = %request.request_id, "request cancelled");
                return Err(e);
            }
        };

        let report = match waited {
            Ok(result) => CopyReport::from_result(result),
            Err(reason) => {
                self.discard_request(request.request_id).await;
                self.session.fall_back()?;
                warn!(request_id = %request.request_id, %reason, "falling back to local clipboard");
                let mut report = copy_locally(&self.clipboard, &input.local_paths).await;
                report.route = CopyRoute::LocalFallback;
                report.fallback_reason = Some(reason);
                report
            }
        };

        self.session.complete()?;
        Ok(report)
    }

    /// Write the request and wait for its result. `Err` carries the reason
    /// the watcher route failed.
    async fn exchange(
        &self,
        decision: ObservationDecision,
        request: &RequestMessage,
    ) -> Result<ResultMessage, String> {
        let request_id = request.request_id;

        self.mailbox
            .ensure()
            .await
            .map_err(|e| format!("Mailbox unavailable: {}", e))?;

        // Observe before writing so a fast result cannot slip past
        let (mut observer, mut events) = MailboxObserver::spawn(
            decision.strategy,
            self.config.poll_interval,
            self.mailbox.dir(),
        )
        .map_err(|e| format!("Cannot observe mailbox: {}", e))?;

        self.mailbox
            .write_request(request)
            .await
            .map_err(|e| format!("Cannot write request: {}", e))?;
        info!(%request_id, paths = request.paths.len(), strategy = %decision.strategy, "request sent");

        let deadline = Instant::now() + self.config.result_timeout.as_std();
        let mut events_open = true;
        let outcome = loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {
                    // The result may have landed after the last event was seen
                    break match self.take_result(request_id).await {
                        Some(result) => Ok(result),
                        None => Err(format!(
                            "Watcher did not respond within {}",
                            self.config.result_timeout
                        )),
                    };
                }
                event = events.recv(), if events_open => match event {
                    Some(event) => {
                        if event.change != Change::Appeared
                            || event.artifact.kind != ArtifactKind::Result
                        {
                            continue;
                        }
                        if event.artifact.request_id != request_id {
                            debug!(other = %event.artifact.request_id, "ignoring result for another request");
                            continue;
                        }
                        if let Some(result) = self.take_result(request_id).await {
                            break Ok(result);
                        }
                    }
                    None => {
                        warn!("mailbox observer stopped; checking for the result on an interval");
                        events_open = false;
                    }
                },
                _ = tokio::time::sleep(self.config.poll_interval), if !events_open => {
                    if let Some(result) = self.take_result(request_id).await {
                        break Ok(result);
                    }
                }
            }
        };

        observer.stop();
        outcome
    }

    /// Read, verify and consume the result for `request_id`
    async fn take_result(&self, request_id: RequestId) -> Option<ResultMessage> {
        let result = match self.mailbox.read_result(request_id).await {
            Ok(Some(result)) => result,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "unreadable result");
                return None;
            }
        };

        if result.request_id != request_id {
            warn!(
                expected = %request_id,
                found = %result.request_id,
                "result content does not match its name; leaving it untouched"
            );
            return None;
        }

        let path = self.mailbox.path_of(&Artifact::result(request_id));
        if let Err(e) = self.mailbox.remove(&path).await {
            warn!(error = %e, "failed to remove consumed result");
        }
        info!(%request_id, sender = %result.sender, success = result.success, "result received");
        Some(result)
    }

    /// Best-effort removal of our own pending request
    async fn discard_request(&self, request_id: RequestId) {
        let path = self.mailbox.path_of(&Artifact::request(request_id));
        match self.mailbox.remove(&path).await {
            Ok(true) => debug!(%request_id, "removed unanswered request"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, %request_id, "could not remove unanswered request"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ClipboardError;
    use crate::domain::observation::{DecisionReason, ObservationStrategy};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MockClipboard {
        calls: Arc<Mutex<Vec<Vec<PathBuf>>>>,
        fail: bool,
    }

    #[async_trait]
    impl FileClipboard for MockClipboard {
        async fn copy_files(&self, paths: &[PathBuf]) -> Result<(), ClipboardError> {
            self.calls.lock().unwrap().push(paths.to_vec());
            if self.fail {
                Err(ClipboardError::ClipboardUnavailable(
                    "no display server".to_string(),
                ))
            } else {
                Ok(())
            }
        }
    }

    fn fast_config() -> RequestConfig {
        RequestConfig {
            force_polling: true,
            ping_timeout: Timeout::from_millis(100),
            result_timeout: Timeout::from_millis(200),
            poll_interval: Duration::from_millis(20),
        }
    }

    fn input(path: &str) -> CopyInput {
        CopyInput {
            host_paths: vec![format!("/host{}", path)],
            local_paths: vec![PathBuf::from(path)],
        }
    }

    #[tokio::test]
    async fn copy_locally_reports_count() {
        let clipboard = MockClipboard::default();
        let report = copy_locally(&clipboard, &[PathBuf::from("/a"), PathBuf::from("/b")]).await;

        assert!(report.success);
        assert_eq!(report.route, CopyRoute::Local);
        assert_eq!(report.message, "Copied 2 file(s)");
    }

    #[tokio::test]
    async fn copy_locally_surfaces_clipboard_error() {
        let clipboard = MockClipboard {
            fail: true,
            ..Default::default()
        };
        let report = copy_locally(&clipboard, &[PathBuf::from("/a")]).await;

        assert!(!report.success);
        assert!(report.message.starts_with("Failed to copy files"));
        assert_eq!(report.errors.len(), 1);
    }

    #[tokio::test]
    async fn copy_locally_with_nothing_fails() {
        let report = copy_locally(&MockClipboard::default(), &[]).await;
        assert!(!report.success);
        assert_eq!(report.message, "No valid files to copy");
    }

    #[tokio::test]
    async fn connect_probes_once() {
        let tmp = tempfile::tempdir().unwrap();
        let mut use_case = CopyRequestUseCase::new(
            Mailbox::new(tmp.path()),
            MockClipboard::default(),
            SenderId::new("box_pid_1"),
            fast_config(),
        );

        let (_tx, mut cancel) = watch::channel(false);
        let first = use_case.connect(&mut cancel).await.unwrap();
        let second = use_case.connect(&mut cancel).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.reason, DecisionReason::Forced);
        assert_eq!(use_case.state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn unanswered_request_falls_back_and_cleans_up() {
        let tmp = tempfile::tempdir().unwrap();
        let mailbox = Mailbox::new(tmp.path());
        let clipboard = MockClipboard::default();
        let mut use_case = CopyRequestUseCase::new(
            mailbox.clone(),
            clipboard.clone(),
            SenderId::new("box_pid_1"),
            fast_config(),
        );
        let (_tx, mut cancel) = watch::channel(false);

        let report = use_case.execute(input("/w/a.txt"), &mut cancel).await.unwrap();

        assert_eq!(report.route, CopyRoute::LocalFallback);
        assert!(report.success);
        assert!(report
            .fallback_reason
            .as_deref()
            .unwrap()
            .contains("did not respond"));
        assert_eq!(
            clipboard.calls.lock().unwrap().as_slice(),
            &[vec![PathBuf::from("/w/a.txt")]]
        );
        assert!(mailbox.list().await.unwrap().is_empty());
        assert_eq!(use_case.state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn matching_result_is_consumed() {
        let tmp = tempfile::tempdir().unwrap();
        let mailbox = Mailbox::new(tmp.path());
        let clipboard = MockClipboard::default();
        let mut config = fast_config();
        config.result_timeout = Timeout::from_secs(5);
        let mut use_case = CopyRequestUseCase::new(
            mailbox.clone(),
            clipboard.clone(),
            SenderId::new("box_pid_1"),
            config,
        )
        .with_decision(ObservationDecision::forced_polling());

        // Stand-in watcher: answer whatever request appears
        let responder = mailbox.clone();
        let watcher = tokio::spawn(async move {
            loop {
                let pending = responder.pending_requests().await.unwrap();
                if let Some((artifact, path)) = pending.into_iter().next() {
                    let request = responder.read_request(&path).await.unwrap();
                    responder.remove(&path).await.unwrap();
                    let result = ResultMessage::copied(
                        SenderId::new("host_pid_2"),
                        artifact.request_id,
                        request.paths.len(),
                        Vec::new(),
                    );
                    responder.write_result(&result).await.unwrap();
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        });
        let (_tx, mut cancel) = watch::channel(false);

        let report = use_case.execute(input("/w/a.txt"), &mut cancel).await.unwrap();
        watcher.await.unwrap();

        assert_eq!(report.route, CopyRoute::Watcher);
        assert_eq!(report.message, "Copied 1 file(s)");
        assert!(clipboard.calls.lock().unwrap().is_empty());
        assert!(mailbox.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn result_written_between_polls_is_taken_at_deadline() {
        let tmp = tempfile::tempdir().unwrap();
        let mailbox = Mailbox::new(tmp.path());
        let clipboard = MockClipboard::default();
        // No polling tick lands inside the result window
        let mut config = fast_config();
        config.poll_interval = Duration::from_secs(5);
        config.result_timeout = Timeout::from_millis(300);
        let mut use_case = CopyRequestUseCase::new(
            mailbox.clone(),
            clipboard.clone(),
            SenderId::new("box_pid_1"),
            config,
        )
        .with_decision(ObservationDecision::forced_polling());

        let responder = mailbox.clone();
        let watcher = tokio::spawn(async move {
            loop {
                let pending = responder.pending_requests().await.unwrap();
                if let Some((artifact, path)) = pending.into_iter().next() {
                    responder.remove(&path).await.unwrap();
                    let result = ResultMessage::copied(
                        SenderId::new("host_pid_2"),
                        artifact.request_id,
                        1,
                        Vec::new(),
                    );
                    responder.write_result(&result).await.unwrap();
                    break;
                }
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        });
        let (_tx, mut cancel) = watch::channel(false);

        let report = use_case.execute(input("/w/a.txt"), &mut cancel).await.unwrap();
        watcher.await.unwrap();

        assert_eq!(report.route, CopyRoute::Watcher);
        assert!(clipboard.calls.lock().unwrap().is_empty());
        assert!(mailbox.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancellation_interrupts_a_long_probe() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = fast_config();
        config.force_polling = false;
        config.ping_timeout = Timeout::from_secs(60);
        let mut use_case = CopyRequestUseCase::new(
            Mailbox::new(tmp.path()),
            MockClipboard::default(),
            SenderId::new("box_pid_1"),
            config,
        );
        let (tx, mut cancel) = watch::channel(false);

        let started = std::time::Instant::now();
        let interrupt = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            tx.send(true).unwrap();
        };
        let (outcome, ()) = tokio::join!(use_case.connect(&mut cancel), interrupt);

        assert!(matches!(outcome, Err(RequestError::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(use_case.decision(), None);
        assert_eq!(use_case.state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn unrelated_result_is_left_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let mailbox = Mailbox::new(tmp.path());
        let stale = ResultMessage::copied(SenderId::new("host"), RequestId::new(), 1, Vec::new());
        mailbox.write_result(&stale).await.unwrap();

        let mut use_case = CopyRequestUseCase::new(
            mailbox.clone(),
            MockClipboard::default(),
            SenderId::new("box_pid_1"),
            fast_config(),
        );
        let (_tx, mut cancel) = watch::channel(false);

        let report = use_case.execute(input("/w/a.txt"), &mut cancel).await.unwrap();

        assert_eq!(report.route, CopyRoute::LocalFallback);
        assert!(mailbox.exists(&Artifact::result(stale.request_id)).await);
    }

    #[tokio::test]
    async fn cancellation_removes_request() {
        let tmp = tempfile::tempdir().unwrap();
        let mailbox = Mailbox::new(tmp.path());
        let mut config = fast_config();
        config.result_timeout = Timeout::from_secs(30);
        let mut use_case = CopyRequestUseCase::new(
            mailbox.clone(),
            MockClipboard::default(),
            SenderId::new("box_pid_1"),
            config,
        );
        let (tx, mut cancel) = watch::channel(false);

        let interrupt = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            tx.send(true).unwrap();
        };
        let (outcome, ()) = tokio::join!(use_case.execute(input("/w/a.txt"), &mut cancel), interrupt);

        assert!(matches!(outcome, Err(RequestError::Cancelled)));
        assert!(mailbox.list().await.unwrap().is_empty());
        assert_eq!(use_case.state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn decision_is_reused_across_calls() {
        let tmp = tempfile::tempdir().unwrap();
        let mut use_case = CopyRequestUseCase::new(
            Mailbox::new(tmp.path()),
            MockClipboard::default(),
            SenderId::new("box_pid_1"),
            fast_config(),
        );
        let (_tx, mut cancel) = watch::channel(false);

        use_case.execute(input("/w/a.txt"), &mut cancel).await.unwrap();
        let decision = use_case.decision().unwrap();
        use_case.execute(input("/w/b.txt"), &mut cancel).await.unwrap();

        assert_eq!(use_case.decision(), Some(decision));
        assert_eq!(decision.strategy, ObservationStrategy::Polling);
    }
}
