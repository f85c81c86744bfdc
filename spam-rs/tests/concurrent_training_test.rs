//! Concurrent training and reads against an on-disk database

use spam_rs::bayes::{
    BayesEngine, GlobalStats, Label, MemoryStatsStore, MessageText, StatsStore,
    StatsTransaction, SPAM_THRESHOLD,
};
use spam_rs::config::StorageConfig;
use spam_rs::db;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const TASKS: usize = 8;
const ROUNDS: usize = 5;

async fn train_concurrently(engine: Arc<BayesEngine>) {
    let mut handles = Vec::new();

    for task in 0..TASKS {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            let label = if task % 2 == 0 { Label::Spam } else { Label::Ham };
            for round in 0..ROUNDS {
                let sender = format!("user{}@load.test", task);
                let body = format!("task{} round{}", task, round);
                engine
                    .train(&MessageText::new(&sender, "shared words here", &body), label)
                    .await
                    .unwrap();
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
}

async fn assert_no_lost_updates(engine: &BayesEngine) {
    let stats = engine.stats().await.unwrap();
    let tokens = engine.store().all_token_stats().await.unwrap();

    let trainings = (TASKS * ROUNDS) as u64;
    assert_eq!(stats.spam_messages + stats.ham_messages, trainings);
    assert_eq!(stats.spam_messages, trainings / 2);

    // Six tokens per message
    assert_eq!(stats.total_spam_tokens + stats.total_ham_tokens, trainings * 6);
    assert_eq!(
        stats.total_spam_tokens,
        tokens.iter().map(|t| t.spam_count).sum::<u64>()
    );
    assert_eq!(
        stats.total_ham_tokens,
        tokens.iter().map(|t| t.ham_count).sum::<u64>()
    );

    // 8 senders, 3 shared words, 8 task ids, 5 round ids
    assert_eq!(stats.vocabulary_size, 24);
    assert_eq!(tokens.len(), 24);

    let shared = engine.token_stats("shared").await.unwrap().unwrap();
    assert_eq!(shared.spam_count, trainings / 2);
    assert_eq!(shared.ham_count, trainings / 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_training_sqlite_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("spam.db");

    let storage = StorageConfig {
        database_url: format!("sqlite://{}", path.display()),
        max_connections: 5,
        busy_timeout_ms: 30_000,
    };
    let pool = db::connect(&storage).await.unwrap();
    let engine = Arc::new(BayesEngine::sqlite(pool.clone(), SPAM_THRESHOLD).await.unwrap());

    train_concurrently(Arc::clone(&engine)).await;
    assert_no_lost_updates(&engine).await;

    // Statistics survive a fresh pool
    pool.close().await;
    let reopened = BayesEngine::sqlite(db::connect(&storage).await.unwrap(), SPAM_THRESHOLD)
        .await
        .unwrap();
    assert_no_lost_updates(&reopened).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_training_memory() {
    let engine = Arc::new(BayesEngine::new(Arc::new(MemoryStatsStore::new())));

    train_concurrently(Arc::clone(&engine)).await;
    assert_no_lost_updates(&engine).await;
}

#[tokio::test]
async fn test_reads_not_blocked_by_open_writer() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("spam.db");

    let storage = StorageConfig {
        database_url: format!("sqlite://{}", path.display()),
        max_connections: 5,
        busy_timeout_ms: 300,
    };
    let pool = db::connect(&storage).await.unwrap();
    let engine = BayesEngine::sqlite(pool, SPAM_THRESHOLD).await.unwrap();
    let message = MessageText::new("a@b.com", "hi there", "");

    // Cold start: the writer holds the lock before the global row exists
    let mut tx = engine.store().begin().await.unwrap();
    let (mut stats, _) = tx.get_or_create_token_stats("hi").await.unwrap();
    stats.spam_count += 1;
    tx.save_token_stats(&stats).await.unwrap();

    let started = Instant::now();
    let result = engine.classify(&message).await.unwrap();
    assert_eq!(result.probability, 0.5);
    assert_eq!(engine.stats().await.unwrap(), GlobalStats::default());
    assert!(started.elapsed() < Duration::from_millis(300));

    drop(tx);

    // Warm: readers see the last committed state while a training is open
    engine.train(&message, Label::Spam).await.unwrap();
    let committed = engine.stats().await.unwrap();

    let mut tx = engine.store().begin().await.unwrap();
    let mut global = tx.global_stats().await.unwrap();
    global.spam_messages += 10;
    tx.save_global_stats(&global).await.unwrap();

    let started = Instant::now();
    assert_eq!(engine.stats().await.unwrap(), committed);
    engine.classify(&message).await.unwrap();
    assert!(started.elapsed() < Duration::from_millis(300));

    drop(tx);
    assert_eq!(engine.stats().await.unwrap().spam_messages, 1);
}
