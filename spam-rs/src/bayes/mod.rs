//! Bayesian spam engine
//!
//! Tokenizer, statistics store, trainer and classifier. The engine learns
//! incrementally from labeled messages and scores new ones with a
//! Laplace-smoothed multinomial Naive Bayes model.

pub mod classifier;
pub mod engine;
pub mod memory;
pub mod sqlite;
pub mod store;
pub mod tokenizer;
pub mod trainer;
pub mod types;

pub use classifier::{Classifier, LAPLACE_ALPHA, SPAM_THRESHOLD};
pub use engine::BayesEngine;
pub use memory::MemoryStatsStore;
pub use sqlite::SqliteStatsStore;
pub use store::{StatsStore, StatsTransaction};
pub use tokenizer::tokenize;
pub use trainer::Trainer;
pub use types::*;
