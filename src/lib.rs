//! fileclip - container-to-host file clipboard over a shared directory
//!
//! A requester inside a container drops JSON request files into a mailbox
//! directory that is bind-mounted from the host. A watcher on the host picks
//! them up, places the referenced files on the host clipboard and answers
//! with a result file. Liveness is checked with a ping that the watcher
//! simply deletes.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Message model, artifact naming, value objects, state machines and errors
//! - **Application**: Use cases (probe, strategy selection, watcher, requester) and ports
//! - **Infrastructure**: Mailbox directory, observers, clipboard tools, config file
//! - **CLI**: Command-line interface, argument parsing, logging and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
