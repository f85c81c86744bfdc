//! Incremental training from labeled messages

use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use super::store::StatsStore;
use super::types::{Label, MessageText, TrainingReport};
use crate::error::{Result, SpamError};

/// Applies labeled messages to a statistics store
pub struct Trainer {
    store: Arc<dyn StatsStore>,
}

impl Trainer {
    pub fn new(store: Arc<dyn StatsStore>) -> Self {
        Self { store }
    }

    /// Add one labeled message to the model.
    ///
    /// Every token occurrence bumps its per-label count and the matching
    /// corpus total; the vocabulary grows by the distinct tokens created
    /// here, and the message counter for `label` grows by one even when the
    /// message has no tokens. All of it commits as one transaction.
    ///
    /// Training is additive: the same message trained twice counts twice.
    pub async fn train(&self, message: &MessageText<'_>, label: Label) -> Result<TrainingReport> {
        let is_spam = match label {
            Label::Spam => true,
            Label::Ham => false,
            Label::Unknown => {
                return Err(SpamError::InvalidLabel(format!(
                    "cannot train on label {}",
                    label
                )))
            }
        };

        let tokens = message.tokens();

        let mut tx = self.store.begin().await?;
        let mut global = tx.global_stats().await?;
        let mut new_tokens: HashSet<&str> = HashSet::new();

        for token in &tokens {
            let (mut stats, created) = tx.get_or_create_token_stats(token).await?;
            if created {
                new_tokens.insert(token.as_str());
            }

            if is_spam {
                stats.spam_count += 1;
                global.total_spam_tokens += 1;
            } else {
                stats.ham_count += 1;
                global.total_ham_tokens += 1;
            }

            tx.save_token_stats(&stats).await?;
        }

        global.vocabulary_size += new_tokens.len() as u64;
        if is_spam {
            global.spam_messages += 1;
        } else {
            global.ham_messages += 1;
        }

        tx.save_global_stats(&global).await?;
        tx.commit().await?;

        debug!(
            "Trained {} message: {} tokens, {} new",
            label,
            tokens.len(),
            new_tokens.len()
        );

        Ok(TrainingReport {
            label,
            tokens: tokens.len(),
            new_tokens: new_tokens.len(),
        })
    }
}
