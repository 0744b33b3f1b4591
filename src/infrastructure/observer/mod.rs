//! Mailbox observers
//!
//! Two interchangeable ways to learn about artifacts appearing in or
//! vanishing from the mailbox: native OS notifications and interval polling.
//! The variant is picked once from an [`ObservationStrategy`].

mod native;
mod polling;

pub use native::NativeObserver;
pub use polling::PollingObserver;

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::artifact::Artifact;
use crate::domain::observation::ObservationStrategy;

/// Observer errors
#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("Failed to start native watcher on {path}: {source}")]
    Native {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("Failed to list mailbox {path}: {source}")]
    Listing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Observer already started")]
    AlreadyStarted,
}

/// What happened to an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Appeared,
    Vanished,
}

/// A change to a classified mailbox artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxEvent {
    pub change: Change,
    pub artifact: Artifact,
    pub path: PathBuf,
}

impl MailboxEvent {
    /// Build an event for `path`, dropping anything that is not an artifact
    fn for_path(change: Change, path: PathBuf) -> Option<Self> {
        Artifact::classify_path(&path).map(|artifact| Self {
            change,
            artifact,
            path,
        })
    }
}

pub type EventSender = mpsc::UnboundedSender<MailboxEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<MailboxEvent>;

/// A mailbox observer, native or polling
pub enum MailboxObserver {
    Native(NativeObserver),
    Polling(PollingObserver),
}

impl MailboxObserver {
    /// Build the observer for a strategy
    pub fn new(strategy: ObservationStrategy, poll_interval: Duration) -> Self {
        match strategy {
            ObservationStrategy::Native => Self::Native(NativeObserver::new()),
            ObservationStrategy::Polling => Self::Polling(PollingObserver::new(poll_interval)),
        }
    }

    /// Build, start and hand back the event stream in one go
    pub fn spawn(
        strategy: ObservationStrategy,
        poll_interval: Duration,
        dir: &Path,
    ) -> Result<(Self, EventReceiver), ObserverError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut observer = Self::new(strategy, poll_interval);
        observer.start(dir, tx)?;
        Ok((observer, rx))
    }

    pub fn strategy(&self) -> ObservationStrategy {
        match self {
            Self::Native(_) => ObservationStrategy::Native,
            Self::Polling(_) => ObservationStrategy::Polling,
        }
    }

    /// Begin delivering events for `dir`. Changes made after this returns
    /// are guaranteed to be reported; pre-existing artifacts are not.
    pub fn start(&mut self, dir: &Path, events: EventSender) -> Result<(), ObserverError> {
        match self {
            Self::Native(o) => o.start(dir, events),
            Self::Polling(o) => o.start(dir, events),
        }
    }

    /// Stop delivering events. Safe to call more than once.
    pub fn stop(&mut self) {
        match self {
            Self::Native(o) => o.stop(),
            Self::Polling(o) => o.stop(),
        }
    }
}

impl Drop for MailboxObserver {
    fn drop(&mut self) {
        self.stop();
    }
}
