//! SQLite-backed statistics store
//!
//! Two tables: `token_stats` (one row per token, unique on `token`) and
//! `global_stats` (a single row with id 1). A writer transaction starts by
//! upserting the global row, which takes the database write lock up front;
//! concurrent writers then queue on SQLite's busy timeout instead of
//! interleaving read-modify-write cycles.

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::collections::HashMap;

use super::store::{StatsStore, StatsTransaction};
use super::types::{GlobalStats, TokenStats};
use crate::error::{Result, SpamError};

const GLOBAL_ID: i64 = 1;

/// Bound parameters per `IN (...)` lookup
const LOOKUP_CHUNK: usize = 500;

const INSERT_GLOBAL: &str = "INSERT OR IGNORE INTO global_stats (id) VALUES (?)";

const SELECT_GLOBAL: &str = "SELECT spam_messages, ham_messages, total_spam_tokens, total_ham_tokens, vocabulary_size FROM global_stats WHERE id = ?";

type GlobalRow = (i64, i64, i64, i64, i64);

fn global_from_row(row: GlobalRow) -> GlobalStats {
    let (spam_messages, ham_messages, total_spam_tokens, total_ham_tokens, vocabulary_size) = row;
    GlobalStats {
        spam_messages: spam_messages as u64,
        ham_messages: ham_messages as u64,
        total_spam_tokens: total_spam_tokens as u64,
        total_ham_tokens: total_ham_tokens as u64,
        vocabulary_size: vocabulary_size as u64,
    }
}

fn token_from_row((token, spam_count, ham_count): (String, i64, i64)) -> TokenStats {
    TokenStats {
        token,
        spam_count: spam_count as u64,
        ham_count: ham_count as u64,
    }
}

/// Statistics store persisted in SQLite
#[derive(Clone)]
pub struct SqliteStatsStore {
    db: SqlitePool,
}

impl SqliteStatsStore {
    /// Create a new store on an existing pool
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Initialize database tables
    pub async fn init_db(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS token_stats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                token TEXT NOT NULL UNIQUE,
                spam_count INTEGER NOT NULL DEFAULT 0,
                ham_count INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS global_stats (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                spam_messages INTEGER NOT NULL DEFAULT 0,
                ham_messages INTEGER NOT NULL DEFAULT 0,
                total_spam_tokens INTEGER NOT NULL DEFAULT 0,
                total_ham_tokens INTEGER NOT NULL DEFAULT 0,
                vocabulary_size INTEGER NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }
}

#[async_trait]
impl StatsStore for SqliteStatsStore {
    async fn global_stats(&self) -> Result<GlobalStats> {
        let row = sqlx::query_as::<_, GlobalRow>(SELECT_GLOBAL)
            .bind(GLOBAL_ID)
            .fetch_optional(&self.db)
            .await?;

        // The row only appears with the first writer transaction; never
        // write from the read path
        Ok(row.map(global_from_row).unwrap_or_default())
    }

    async fn token_stats(&self, token: &str) -> Result<Option<TokenStats>> {
        let row = sqlx::query_as::<_, (String, i64, i64)>(
            "SELECT token, spam_count, ham_count FROM token_stats WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(token_from_row))
    }

    async fn token_stats_many(&self, tokens: &[String]) -> Result<HashMap<String, TokenStats>> {
        let mut unique: Vec<&str> = tokens.iter().map(String::as_str).collect();
        unique.sort_unstable();
        unique.dedup();

        let mut found = HashMap::with_capacity(unique.len());

        for chunk in unique.chunks(LOOKUP_CHUNK) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "SELECT token, spam_count, ham_count FROM token_stats WHERE token IN (",
            );
            let mut separated = builder.separated(", ");
            for token in chunk {
                separated.push_bind(*token);
            }
            separated.push_unseparated(")");

            let rows = builder
                .build_query_as::<(String, i64, i64)>()
                .fetch_all(&self.db)
                .await?;

            for row in rows {
                let stats = token_from_row(row);
                found.insert(stats.token.clone(), stats);
            }
        }

        Ok(found)
    }

    async fn all_token_stats(&self) -> Result<Vec<TokenStats>> {
        let rows = sqlx::query_as::<_, (String, i64, i64)>(
            "SELECT token, spam_count, ham_count FROM token_stats ORDER BY token",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(token_from_row).collect())
    }

    async fn begin(&self) -> Result<Box<dyn StatsTransaction>> {
        let mut tx = self.db.begin().await?;

        // Writing first makes this connection the single writer before it
        // reads anything, and lazily creates the singleton row.
        sqlx::query(INSERT_GLOBAL)
            .bind(GLOBAL_ID)
            .execute(&mut *tx)
            .await?;

        Ok(Box::new(SqliteStatsTransaction { tx: Some(tx) }))
    }
}

/// Writer transaction over [`SqliteStatsStore`]. Rolls back on drop.
pub struct SqliteStatsTransaction {
    tx: Option<Transaction<'static, Sqlite>>,
}

impl SqliteStatsTransaction {
    fn conn(&mut self) -> Result<&mut SqliteConnection> {
        self.tx.as_deref_mut().ok_or(SpamError::TransactionFinished)
    }
}

#[async_trait]
impl StatsTransaction for SqliteStatsTransaction {
    async fn global_stats(&mut self) -> Result<GlobalStats> {
        let row = sqlx::query_as::<_, GlobalRow>(SELECT_GLOBAL)
            .bind(GLOBAL_ID)
            .fetch_one(self.conn()?)
            .await?;

        Ok(global_from_row(row))
    }

    async fn get_or_create_token_stats(&mut self, token: &str) -> Result<(TokenStats, bool)> {
        let inserted = sqlx::query("INSERT OR IGNORE INTO token_stats (token) VALUES (?)")
            .bind(token)
            .execute(self.conn()?)
            .await?
            .rows_affected();

        let row = sqlx::query_as::<_, (String, i64, i64)>(
            "SELECT token, spam_count, ham_count FROM token_stats WHERE token = ?",
        )
        .bind(token)
        .fetch_one(self.conn()?)
        .await?;

        Ok((token_from_row(row), inserted == 1))
    }

    async fn save_token_stats(&mut self, stats: &TokenStats) -> Result<()> {
        sqlx::query("UPDATE token_stats SET spam_count = ?, ham_count = ? WHERE token = ?")
            .bind(stats.spam_count as i64)
            .bind(stats.ham_count as i64)
            .bind(&stats.token)
            .execute(self.conn()?)
            .await?;

        Ok(())
    }

    async fn save_global_stats(&mut self, stats: &GlobalStats) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE global_stats
            SET spam_messages = ?, ham_messages = ?, total_spam_tokens = ?,
                total_ham_tokens = ?, vocabulary_size = ?
            WHERE id = ?
            "#,
        )
        .bind(stats.spam_messages as i64)
        .bind(stats.ham_messages as i64)
        .bind(stats.total_spam_tokens as i64)
        .bind(stats.total_ham_tokens as i64)
        .bind(stats.vocabulary_size as i64)
        .bind(GLOBAL_ID)
        .execute(self.conn()?)
        .await?;

        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        let tx = self.tx.take().ok_or(SpamError::TransactionFinished)?;
        tx.commit().await?;
        Ok(())
    }
}
