//! Keyword and sender rules
//!
//! A user-maintained list that can force a message to spam or keep it in
//! the inbox regardless of the model's decision. Rules never train the model.

pub mod manager;
pub mod types;

pub use manager::RuleManager;
pub use types::*;
