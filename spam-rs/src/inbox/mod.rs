//! Inbox of classified messages
//!
//! Stores each classified message with its verdict, takes review labels
//! (which train the engine) and broadcasts newly recorded messages.

pub mod manager;
pub mod types;

pub use manager::InboxManager;
pub use types::MessageRecord;
