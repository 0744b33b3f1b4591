//! Observation strategy decision
//!
//! Resolved once per process and handed to the use cases as a plain value.

use std::fmt;

/// How a process watches the mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObservationStrategy {
    /// OS change notifications
    Native,
    /// Periodic directory listing
    Polling,
}

impl ObservationStrategy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Polling => "polling",
        }
    }
}

impl fmt::Display for ObservationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a strategy was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    /// Polling was forced by configuration
    Forced,
    /// A ping round-trip over native events succeeded
    ProbeSucceeded,
    /// The ping went unanswered within the probe window
    ProbeFailed,
    /// The watcher side has no peer to probe
    NoPeer,
}

/// An immutable observation decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationDecision {
    pub strategy: ObservationStrategy,
    pub reason: DecisionReason,
}

impl ObservationDecision {
    pub const fn forced_polling() -> Self {
        Self {
            strategy: ObservationStrategy::Polling,
            reason: DecisionReason::Forced,
        }
    }

    /// Map a probe verdict onto a strategy
    pub const fn from_probe(alive: bool) -> Self {
        if alive {
            Self {
                strategy: ObservationStrategy::Native,
                reason: DecisionReason::ProbeSucceeded,
            }
        } else {
            Self {
                strategy: ObservationStrategy::Polling,
                reason: DecisionReason::ProbeFailed,
            }
        }
    }

    /// The watcher honors the force flag and otherwise trusts native events
    pub const fn for_watcher(force_polling: bool) -> Self {
        if force_polling {
            Self::forced_polling()
        } else {
            Self {
                strategy: ObservationStrategy::Native,
                reason: DecisionReason::NoPeer,
            }
        }
    }

    /// Whether the probe found a live watcher
    pub fn peer_confirmed(&self) -> bool {
        self.reason == DecisionReason::ProbeSucceeded
    }
}
