//! Domain layer - Core protocol model
//!
//! Contains the mailbox message model, artifact naming, value objects,
//! session state machines and domain errors.
//! This layer has no dependencies on external systems.

pub mod artifact;
pub mod config;
pub mod error;
pub mod message;
pub mod observation;
pub mod paths;
pub mod session;
pub mod timeout;

// Re-export common types
pub use artifact::{Artifact, ArtifactKind};
pub use config::AppConfig;
pub use error::*;
pub use message::{Action, RequestId, RequestMessage, ResultMessage, SenderId};
pub use observation::{DecisionReason, ObservationDecision, ObservationStrategy};
pub use session::{RequestSession, RequestState, WatcherSession, WatcherState};
pub use timeout::Timeout;
