//! Naive Bayes classification
//!
//! Log-space multinomial Naive Bayes with add-one smoothing. Message counts
//! and vocabulary size are floored at 1 so a cold model yields even odds.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::store::StatsStore;
use super::types::{Classification, GlobalStats, MessageText, TokenStats};
use crate::error::Result;

/// Laplace smoothing constant
pub const LAPLACE_ALPHA: f64 = 1.0;

/// Default probability at or above which a message is spam
pub const SPAM_THRESHOLD: f64 = 0.90;

/// Log-odds of spam over ham for `tokens` under `global`.
///
/// Tokens missing from `counts` contribute as if seen zero times.
pub fn log_odds(global: &GlobalStats, tokens: &[String], counts: &HashMap<String, TokenStats>) -> f64 {
    let spam_docs = global.spam_messages.max(1) as f64;
    let ham_docs = global.ham_messages.max(1) as f64;
    let prior_spam = (spam_docs / (spam_docs + ham_docs)).ln();
    let prior_ham = (ham_docs / (spam_docs + ham_docs)).ln();

    let vocabulary = global.vocabulary_size.max(1) as f64;
    let denom_spam = global.total_spam_tokens as f64 + LAPLACE_ALPHA * vocabulary;
    let denom_ham = global.total_ham_tokens as f64 + LAPLACE_ALPHA * vocabulary;

    let mut log_spam = prior_spam;
    let mut log_ham = prior_ham;

    for token in tokens {
        let (spam_count, ham_count) = counts
            .get(token)
            .map(|s| (s.spam_count as f64, s.ham_count as f64))
            .unwrap_or((0.0, 0.0));

        log_spam += ((spam_count + LAPLACE_ALPHA) / denom_spam).ln();
        log_ham += ((ham_count + LAPLACE_ALPHA) / denom_ham).ln();
    }

    log_spam - log_ham
}

/// Read-only classifier over a statistics store
pub struct Classifier {
    store: Arc<dyn StatsStore>,
    threshold: f64,
}

impl Classifier {
    pub fn new(store: Arc<dyn StatsStore>) -> Self {
        Self::with_threshold(store, SPAM_THRESHOLD)
    }

    pub fn with_threshold(store: Arc<dyn StatsStore>, threshold: f64) -> Self {
        Self { store, threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Score a message against the current statistics. Never mutates them.
    pub async fn classify(&self, message: &MessageText<'_>) -> Result<Classification> {
        let global = self.store.global_stats().await?;
        let tokens = message.tokens();
        let counts = self.store.token_stats_many(&tokens).await?;

        let result = Classification::from_score(log_odds(&global, &tokens, &counts), self.threshold);

        debug!(
            "Classified message ({} tokens): score={:.4} p={:.4} spam={}",
            tokens.len(),
            result.score,
            result.probability,
            result.is_spam
        );

        Ok(result)
    }
}
