//! SQLite connection pool setup

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::config::StorageConfig;
use crate::error::Result;

/// Open a pool for `storage.database_url`, creating the file if missing.
///
/// File databases run in WAL mode so classification reads are not blocked
/// by a training write. An in-memory database exists per connection, so it
/// gets exactly one connection that is never recycled. Both `sqlite::memory:`
/// and URLs carrying `mode=memory` count as in-memory.
pub async fn connect(storage: &StorageConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&storage.database_url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_millis(storage.busy_timeout_ms));

    if is_in_memory(&storage.database_url) {
        debug!("Opening in-memory database");
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        return Ok(pool);
    }

    debug!(
        "Opening database {} ({} connections, busy_timeout={}ms)",
        storage.database_url, storage.max_connections, storage.busy_timeout_ms
    );

    let pool = SqlitePoolOptions::new()
        .max_connections(storage.max_connections)
        .connect_with(
            options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal),
        )
        .await?;

    Ok(pool)
}

fn is_in_memory(url: &str) -> bool {
    if url.contains(":memory:") {
        return true;
    }

    url.split_once('?')
        .map(|(_, query)| query.split('&').any(|param| param == "mode=memory"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_urls() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://file:inbox?mode=memory"));
        assert!(is_in_memory("sqlite:inbox?cache=shared&mode=memory"));

        assert!(!is_in_memory("sqlite://spam.db"));
        assert!(!is_in_memory("sqlite://spam.db?mode=rwc"));
        assert!(!is_in_memory("sqlite://memory.db"));
    }

    #[tokio::test]
    async fn test_memory_mode_url_gets_single_connection() {
        let storage = StorageConfig {
            database_url: "sqlite:stats?mode=memory".to_string(),
            max_connections: 5,
            busy_timeout_ms: 1_000,
        };
        let pool = connect(&storage).await.unwrap();

        sqlx::query("CREATE TABLE scratch (id INTEGER)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO scratch (id) VALUES (1)")
            .execute(&pool)
            .await
            .unwrap();

        let held = pool.acquire().await.unwrap();
        assert!(pool.try_acquire().is_none());
        drop(held);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM scratch")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
