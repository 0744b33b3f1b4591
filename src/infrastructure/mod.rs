//! Infrastructure layer - Adapter implementations
//!
//! Contains the filesystem mailbox, the mailbox observers and the concrete
//! implementations of the port interfaces.

pub mod clipboard;
pub mod config;
pub mod mailbox;
pub mod observer;

// Re-export adapters
pub use clipboard::create_clipboard;
pub use config::XdgConfigStore;
pub use mailbox::{Mailbox, MailboxError};
pub use observer::{Change, MailboxEvent, MailboxObserver, ObserverError};
