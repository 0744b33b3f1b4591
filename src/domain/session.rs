//! Requester and watcher session state machines

use std::fmt;
use thiserror::Error;

/// Watcher states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WatcherState {
    #[default]
    Idle,
    Observing,
    Processing,
    Stopped,
}

impl WatcherState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Observing => "observing",
            Self::Processing => "processing",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for WatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Requester states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Probing,
    AwaitingResult,
    Fallback,
}

impl RequestState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Probing => "probing",
            Self::AwaitingResult => "awaiting_result",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: String,
    pub action: String,
}

impl InvalidStateTransition {
    fn new(state: impl fmt::Display, action: &str) -> Self {
        Self {
            current_state: state.to_string(),
            action: action.to_string(),
        }
    }
}

/// Watcher session entity.
///
/// State machine:
///   IDLE -> OBSERVING (start)
///   OBSERVING -> PROCESSING (begin_processing)
///   PROCESSING -> OBSERVING (finish_processing)
///   IDLE | OBSERVING -> STOPPED (stop)
#[derive(Debug, Default)]
pub struct WatcherSession {
    state: WatcherState,
}

impl WatcherSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn start(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != WatcherState::Idle {
            return Err(InvalidStateTransition::new(self.state, "start observing"));
        }
        self.state = WatcherState::Observing;
        Ok(())
    }

    pub fn begin_processing(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != WatcherState::Observing {
            return Err(InvalidStateTransition::new(self.state, "process a request"));
        }
        self.state = WatcherState::Processing;
        Ok(())
    }

    pub fn finish_processing(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != WatcherState::Processing {
            return Err(InvalidStateTransition::new(self.state, "finish processing"));
        }
        self.state = WatcherState::Observing;
        Ok(())
    }

    /// In-flight processing must finish before the session can stop
    pub fn stop(&mut self) -> Result<(), InvalidStateTransition> {
        match self.state {
            WatcherState::Idle | WatcherState::Observing => {
                self.state = WatcherState::Stopped;
                Ok(())
            }
            _ => Err(InvalidStateTransition::new(self.state, "stop")),
        }
    }
}

/// Requester session entity.
///
/// State machine:
///   IDLE -> PROBING (begin_probe)
///   PROBING -> IDLE (finish_probe)
///   IDLE -> AWAITING_RESULT (await_result)
///   AWAITING_RESULT -> IDLE (complete)
///   AWAITING_RESULT -> FALLBACK (fall_back)
///   FALLBACK -> IDLE (complete)
#[derive(Debug, Default)]
pub struct RequestSession {
    state: RequestState,
}

impl RequestSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn begin_probe(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(RequestState::Idle, RequestState::Probing, "probe")
    }

    pub fn finish_probe(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(RequestState::Probing, RequestState::Idle, "finish probing")
    }

    pub fn await_result(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(RequestState::Idle, RequestState::AwaitingResult, "await a result")
    }

    pub fn fall_back(&mut self) -> Result<(), InvalidStateTransition> {
        self.transition(RequestState::AwaitingResult, RequestState::Fallback, "fall back")
    }

    /// Return to idle after a verdict, from either waiting or fallback
    pub fn complete(&mut self) -> Result<(), InvalidStateTransition> {
        match self.state {
            RequestState::AwaitingResult | RequestState::Fallback => {
                self.state = RequestState::Idle;
                Ok(())
            }
            _ => Err(InvalidStateTransition::new(self.state, "complete")),
        }
    }

    fn transition(
        &mut self,
        from: RequestState,
        to: RequestState,
        action: &str,
    ) -> Result<(), InvalidStateTransition> {
        if self.state != from {
            return Err(InvalidStateTransition::new(self.state, action));
        }
        self.state = to;
        Ok(())
    }
}
