//! Bayes engine facade
//!
//! Owns one statistics store and exposes the two operations collaborators
//! need: train a labeled message and classify an unlabeled one.

use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;

use super::classifier::{Classifier, SPAM_THRESHOLD};
use super::memory::MemoryStatsStore;
use super::sqlite::SqliteStatsStore;
use super::store::StatsStore;
use super::trainer::Trainer;
use super::types::{Classification, GlobalStats, Label, MessageText, TokenStats, TrainingReport};
use crate::error::Result;

/// Spam/ham engine
pub struct BayesEngine {
    store: Arc<dyn StatsStore>,
    trainer: Trainer,
    classifier: Classifier,
}

impl BayesEngine {
    /// Create an engine over any store with the default threshold
    pub fn new(store: Arc<dyn StatsStore>) -> Self {
        Self::with_threshold(store, SPAM_THRESHOLD)
    }

    /// Create an engine with a custom spam probability threshold
    pub fn with_threshold(store: Arc<dyn StatsStore>, threshold: f64) -> Self {
        Self {
            trainer: Trainer::new(Arc::clone(&store)),
            classifier: Classifier::with_threshold(Arc::clone(&store), threshold),
            store,
        }
    }

    /// Engine persisted in SQLite. Creates the tables if needed.
    pub async fn sqlite(db: SqlitePool, threshold: f64) -> Result<Self> {
        let store = SqliteStatsStore::new(db);
        store.init_db().await?;
        info!("Bayes statistics store ready (sqlite)");
        Ok(Self::with_threshold(Arc::new(store), threshold))
    }

    /// Engine that keeps its statistics in memory
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStatsStore::new()))
    }

    /// Update the model with a human-assigned label
    pub async fn train(&self, message: &MessageText<'_>, label: Label) -> Result<TrainingReport> {
        self.trainer.train(message, label).await
    }

    /// Score a message against the current model
    pub async fn classify(&self, message: &MessageText<'_>) -> Result<Classification> {
        self.classifier.classify(message).await
    }

    /// Corpus-wide counters
    pub async fn stats(&self) -> Result<GlobalStats> {
        self.store.global_stats().await
    }

    /// Counts for a single token, if it was ever trained
    pub async fn token_stats(&self, token: &str) -> Result<Option<TokenStats>> {
        self.store.token_stats(token).await
    }

    pub fn threshold(&self) -> f64 {
        self.classifier.threshold()
    }

    pub fn store(&self) -> &Arc<dyn StatsStore> {
        &self.store
    }
}
