//! In-memory statistics store
//!
//! Committed state sits behind an `RwLock`; a separate writer mutex is held
//! for the lifetime of each transaction, so writers run one at a time while
//! readers only wait for the short commit step. Transactions stage their
//! changes locally and publish them on commit.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::store::{StatsStore, StatsTransaction};
use super::types::{GlobalStats, TokenStats};
use crate::error::{Result, SpamError};

#[derive(Debug, Default)]
struct MemoryState {
    global: Option<GlobalStats>,
    tokens: HashMap<String, TokenStats>,
}

/// Statistics store that lives only as long as the process
#[derive(Clone, Default)]
pub struct MemoryStatsStore {
    state: Arc<RwLock<MemoryState>>,
    writer: Arc<Mutex<()>>,
}

impl MemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatsStore for MemoryStatsStore {
    async fn global_stats(&self) -> Result<GlobalStats> {
        let state = self.state.read().await;
        Ok(state.global.clone().unwrap_or_default())
    }

    async fn token_stats(&self, token: &str) -> Result<Option<TokenStats>> {
        let state = self.state.read().await;
        Ok(state.tokens.get(token).cloned())
    }

    async fn token_stats_many(&self, tokens: &[String]) -> Result<HashMap<String, TokenStats>> {
        let state = self.state.read().await;
        Ok(tokens
            .iter()
            .filter_map(|t| state.tokens.get(t).map(|s| (t.clone(), s.clone())))
            .collect())
    }

    async fn all_token_stats(&self) -> Result<Vec<TokenStats>> {
        let state = self.state.read().await;
        let mut all: Vec<TokenStats> = state.tokens.values().cloned().collect();
        all.sort_by(|a, b| a.token.cmp(&b.token));
        Ok(all)
    }

    async fn begin(&self) -> Result<Box<dyn StatsTransaction>> {
        let writer = Arc::clone(&self.writer).lock_owned().await;

        Ok(Box::new(MemoryStatsTransaction {
            state: Arc::clone(&self.state),
            _writer: writer,
            global: None,
            tokens: HashMap::new(),
            finished: false,
        }))
    }
}

/// Staged writes against a [`MemoryStatsStore`]
pub struct MemoryStatsTransaction {
    state: Arc<RwLock<MemoryState>>,
    _writer: OwnedMutexGuard<()>,
    global: Option<GlobalStats>,
    tokens: HashMap<String, TokenStats>,
    finished: bool,
}

impl MemoryStatsTransaction {
    fn ensure_open(&self) -> Result<()> {
        if self.finished {
            Err(SpamError::TransactionFinished)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StatsTransaction for MemoryStatsTransaction {
    async fn global_stats(&mut self) -> Result<GlobalStats> {
        self.ensure_open()?;
        if let Some(global) = &self.global {
            return Ok(global.clone());
        }

        let committed = self.state.read().await.global.clone().unwrap_or_default();
        self.global = Some(committed.clone());
        Ok(committed)
    }

    async fn get_or_create_token_stats(&mut self, token: &str) -> Result<(TokenStats, bool)> {
        self.ensure_open()?;
        if let Some(staged) = self.tokens.get(token) {
            return Ok((staged.clone(), false));
        }

        let committed = self.state.read().await.tokens.get(token).cloned();
        let (stats, created) = match committed {
            Some(stats) => (stats, false),
            None => (TokenStats::new(token), true),
        };

        self.tokens.insert(token.to_string(), stats.clone());
        Ok((stats, created))
    }

    async fn save_token_stats(&mut self, stats: &TokenStats) -> Result<()> {
        self.ensure_open()?;
        self.tokens.insert(stats.token.clone(), stats.clone());
        Ok(())
    }

    async fn save_global_stats(&mut self, stats: &GlobalStats) -> Result<()> {
        self.ensure_open()?;
        self.global = Some(stats.clone());
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.finished = true;

        let mut state = self.state.write().await;
        let staged_global = self.global.take();
        let global = state.global.get_or_insert_with(GlobalStats::default);
        if let Some(staged) = staged_global {
            *global = staged;
        }
        state.tokens.extend(self.tokens.drain());
        Ok(())
    }
}
