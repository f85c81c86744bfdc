//! Statistics store abstraction
//!
//! The store owns token and global statistics. Readers go through
//! [`StatsStore`] directly; every mutation happens inside a
//! [`StatsTransaction`], which commits all of its writes or none of them.
//! Implementations serialize transactions so that concurrent trainings
//! never lose an increment.

use async_trait::async_trait;
use std::collections::HashMap;

use super::types::{GlobalStats, TokenStats};
use crate::error::Result;

/// Read access and transaction factory for Bayes statistics
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Global counters, zeroed until the first transaction commits.
    /// Never writes, so it is not held up by an open transaction.
    async fn global_stats(&self) -> Result<GlobalStats>;

    /// Look up one token without creating it
    async fn token_stats(&self, token: &str) -> Result<Option<TokenStats>>;

    /// Look up many tokens at once. Unknown tokens are absent from the map.
    async fn token_stats_many(&self, tokens: &[String]) -> Result<HashMap<String, TokenStats>>;

    /// Every token record, ordered by token
    async fn all_token_stats(&self) -> Result<Vec<TokenStats>>;

    /// Start a writer transaction. Blocks while another writer is active.
    async fn begin(&self) -> Result<Box<dyn StatsTransaction>>;
}

/// One atomic unit of writes. Dropping it without [`commit`] discards
/// everything staged so far.
///
/// [`commit`]: StatsTransaction::commit
#[async_trait]
pub trait StatsTransaction: Send {
    /// Global counters as seen inside this transaction
    async fn global_stats(&mut self) -> Result<GlobalStats>;

    /// Existing record for `token`, or a new zeroed one. The flag is true
    /// when the record was created by this call.
    async fn get_or_create_token_stats(&mut self, token: &str) -> Result<(TokenStats, bool)>;

    async fn save_token_stats(&mut self, stats: &TokenStats) -> Result<()>;

    async fn save_global_stats(&mut self, stats: &GlobalStats) -> Result<()>;

    /// Make every staged write visible. The transaction is finished afterwards.
    async fn commit(&mut self) -> Result<()>;
}
