//! spam-rs: Bayesian spam filter
//!
//! Classifies short messages (sender, subject, body) as spam or ham with a
//! Naive Bayes model that learns incrementally from review labels.
//!
//! # Features
//!
//! - **Engine**: tokenizer, persistent token/global statistics, trainer and
//!   log-space classifier with Laplace smoothing
//! - **Storage**: SQLite (durable) or in-memory statistics stores, both
//!   serializing concurrent trainings
//! - **Inbox**: classified message records, review labels, spam view and a
//!   broadcast feed of new messages
//! - **Rules**: keyword and sender rules that can override the verdict
//!
//! # Example
//!
//! ```no_run
//! use spam_rs::bayes::{BayesEngine, Label, MessageText};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = BayesEngine::in_memory();
//!
//!     let message = MessageText::new("a@b.com", "win money now", "click here");
//!     engine.train(&message, Label::Spam).await?;
//!
//!     let result = engine.classify(&message).await?;
//!     println!("p(spam) = {:.3}", result.probability);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`bayes`]: tokenizer, statistics stores, trainer, classifier
//! - [`inbox`]: message records and review labels
//! - [`rules`]: keyword/sender rules
//! - [`config`]: configuration management
//! - [`db`]: SQLite pool setup
//! - [`error`]: error types and handling

pub mod bayes;
pub mod config;
pub mod db;
pub mod error;
pub mod inbox;
pub mod rules;

// Re-export commonly used types
pub use bayes::{BayesEngine, Classification, Label, MessageText};
pub use config::Config;
pub use error::{Result, SpamError};
