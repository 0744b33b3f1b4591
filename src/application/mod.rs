//! Application layer - Use cases and port interfaces
//!
//! Contains the requester and watcher use cases, the liveness probe and
//! strategy selection, plus trait definitions for external systems.

pub mod ports;
pub mod probe;
pub mod request;
pub mod shutdown;
pub mod strategy;
pub mod watcher;

// Re-export use cases
pub use probe::{LivenessProbe, ProbeError};
pub use request::{
    copy_locally, CopyInput, CopyReport, CopyRequestUseCase, CopyRoute, RequestConfig,
    RequestError,
};
pub use strategy::select_strategy;
pub use watcher::{ProcessOutcome, SweepReport, WatcherConfig, WatcherError, WatcherUseCase};
