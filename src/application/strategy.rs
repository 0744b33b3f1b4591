//! Observation strategy selection
//!
//! Decides once per process whether native notifications can be trusted on
//! the mailbox mount. The result is a plain value handed to the use cases.

use tracing::{info, warn};

use crate::domain::observation::{ObservationDecision, ObservationStrategy};
use crate::domain::timeout::Timeout;

use super::probe::LivenessProbe;

/// Pick the requester's observation strategy.
///
/// Forced polling skips the probe. Otherwise a ping is sent over native
/// events: an answer proves both the peer and the notifications work. Any
/// failure is ambiguous between "no watcher" and "events don't cross this
/// mount", and polling covers both.
pub async fn select_strategy(
    probe: &LivenessProbe,
    force_polling: bool,
    ping_timeout: Timeout,
) -> ObservationDecision {
    if force_polling {
        info!("polling forced by configuration");
        return ObservationDecision::forced_polling();
    }

    let alive = match probe.probe(ObservationStrategy::Native, ping_timeout).await {
        Ok(alive) => alive,
        Err(err) => {
            warn!(error = %err, "liveness probe could not run");
            false
        }
    };

    let decision = ObservationDecision::from_probe(alive);
    if alive {
        info!(strategy = %decision.strategy, "watcher answered ping");
    } else {
        warn!(
            timeout = %ping_timeout,
            "no watcher answered within the probe window; falling back to polling"
        );
    }
    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::message::SenderId;
    use crate::domain::observation::DecisionReason;
    use crate::infrastructure::mailbox::Mailbox;
    use std::time::Duration;

    fn probe_for(dir: &std::path::Path) -> LivenessProbe {
        LivenessProbe::new(
            Mailbox::new(dir),
            SenderId::new("box_pid_1"),
            Duration::from_millis(20),
        )
    }

    #[tokio::test]
    async fn forced_polling_skips_probe() {
        let tmp = tempfile::tempdir().unwrap();
        let probe = probe_for(tmp.path());

        let decision = select_strategy(&probe, true, Timeout::from_secs(5)).await;

        assert_eq!(decision.reason, DecisionReason::Forced);
        assert_eq!(decision.strategy, ObservationStrategy::Polling);
        // No ping was written
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn silent_mailbox_selects_polling() {
        let tmp = tempfile::tempdir().unwrap();
        let probe = probe_for(tmp.path());

        let decision = select_strategy(&probe, false, Timeout::from_millis(100)).await;

        assert_eq!(decision.reason, DecisionReason::ProbeFailed);
        assert_eq!(decision.strategy, ObservationStrategy::Polling);
    }
}
