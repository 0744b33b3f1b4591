//! Liveness probe
//!
//! Writes a ping request and waits for a watcher to consume it. A ping never
//! produces a result file; the disappearance of the request is the answer.

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::domain::artifact::Artifact;
use crate::domain::message::{RequestMessage, SenderId};
use crate::domain::observation::ObservationStrategy;
use crate::domain::timeout::Timeout;
use crate::infrastructure::mailbox::{Mailbox, MailboxError};
use crate::infrastructure::observer::{Change, MailboxObserver, ObserverError};

/// Errors that prevent a probe from running at all
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Mailbox(#[from] MailboxError),

    #[error(transparent)]
    Observer(#[from] ObserverError),
}

/// Ping round-trip against the mailbox
pub struct LivenessProbe {
    mailbox: Mailbox,
    sender: SenderId,
    poll_interval: Duration,
}

impl LivenessProbe {
    pub fn new(mailbox: Mailbox, sender: SenderId, poll_interval: Duration) -> Self {
        Self {
            mailbox,
            sender,
            poll_interval,
        }
    }

    /// Returns `true` when a watcher removed the ping within `timeout`.
    ///
    /// An unanswered ping is left in place for a slow watcher to clean up.
    pub async fn probe(
        &self,
        strategy: ObservationStrategy,
        timeout: Timeout,
    ) -> Result<bool, ProbeError> {
        self.mailbox.ensure().await?;

        let (mut observer, mut events) =
            MailboxObserver::spawn(strategy, self.poll_interval, self.mailbox.dir())?;

        let ping = RequestMessage::ping(self.sender.clone());
        let artifact = Artifact::request(ping.request_id);
        self.mailbox.write_request(&ping).await?;
        debug!(request_id = %ping.request_id, %strategy, "ping sent");

        let deadline = Instant::now() + timeout.as_std();
        let alive = loop {
            tokio::select! {
                // A delete between two polling ticks leaves no event behind
                _ = tokio::time::sleep_until(deadline) => break !self.mailbox.exists(&artifact).await,
                event = events.recv() => match event {
                    Some(event) if event.artifact == artifact && event.change == Change::Vanished => {
                        break true;
                    }
                    Some(_) => {
                        // Renames can coalesce into a single event, so double-check on disk
                        if !self.mailbox.exists(&artifact).await {
                            break true;
                        }
                    }
                    None => {
                        // Observer gone; wait out the window so the verdict stays time-bounded
                        tokio::time::sleep_until(deadline).await;
                        break !self.mailbox.exists(&artifact).await;
                    }
                },
            }
        };

        observer.stop();
        info!(request_id = %ping.request_id, alive, "liveness probe finished");
        Ok(alive)
    }
}
