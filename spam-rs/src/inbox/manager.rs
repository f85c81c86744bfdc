//! Inbox manager - message records, review labels and new-message feed

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::types::MessageRecord;
use crate::bayes::{BayesEngine, Label, MessageText};
use crate::error::{Result, SpamError};
use crate::rules::{RuleAction, RuleManager};

/// Buffered events per subscriber before the slowest one starts lagging
const EVENT_CAPACITY: usize = 64;

const SELECT_MESSAGE: &str = "SELECT id, sender, subject, body, label, is_spam, score, probability, classified_at FROM messages";

/// Classifies incoming messages, stores them and feeds review labels back
/// into the engine
pub struct InboxManager {
    db: SqlitePool,
    engine: Arc<BayesEngine>,
    rules: Option<Arc<RuleManager>>,
    events: broadcast::Sender<MessageRecord>,
}

impl InboxManager {
    /// Create a new inbox manager
    pub fn new(db: SqlitePool, engine: Arc<BayesEngine>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            db,
            engine,
            rules: None,
            events,
        }
    }

    /// Let a rule list override the model's verdict
    pub fn with_rules(mut self, rules: Arc<RuleManager>) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Initialize database tables
    pub async fn init_db(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sender TEXT NOT NULL DEFAULT '',
                subject TEXT NOT NULL DEFAULT '',
                body TEXT NOT NULL DEFAULT '',
                label TEXT NOT NULL DEFAULT 'UNKNOWN',
                is_spam INTEGER,
                score REAL,
                probability REAL,
                classified_at TEXT
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_messages_spam
            ON messages(is_spam, classified_at)
            "#,
        )
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Receive every message recorded from now on
    pub fn subscribe(&self) -> broadcast::Receiver<MessageRecord> {
        self.events.subscribe()
    }

    /// Classify a message, store it as UNKNOWN and announce it.
    ///
    /// Does not train. A matching rule decides `is_spam`; score and
    /// probability always come from the model.
    pub async fn classify_and_record(
        &self,
        sender: &str,
        subject: &str,
        body: &str,
    ) -> Result<MessageRecord> {
        let result = self
            .engine
            .classify(&MessageText::new(sender, subject, body))
            .await?;

        let mut is_spam = result.is_spam;
        if let Some(rules) = &self.rules {
            if let Some(verdict) = rules.evaluate(sender, subject, body).await? {
                debug!("Rule {} overrides model verdict", verdict.rule_id);
                is_spam = verdict.action == RuleAction::MarkSpam;
            }
        }

        let classified_at = Utc::now();

        let id = sqlx::query(
            r#"
            INSERT INTO messages (sender, subject, body, label, is_spam, score, probability, classified_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(sender)
        .bind(subject)
        .bind(body)
        .bind(Label::Unknown.as_str())
        .bind(is_spam)
        .bind(result.score)
        .bind(result.probability)
        .bind(classified_at.to_rfc3339())
        .execute(&self.db)
        .await?
        .last_insert_rowid();

        let record = MessageRecord {
            id,
            sender: sender.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            label: Label::Unknown,
            is_spam: Some(is_spam),
            score: Some(result.score),
            probability: Some(result.probability),
            classified_at: Some(classified_at),
        };

        info!(
            "Recorded message {} (p={:.3}, spam={})",
            id, result.probability, is_spam
        );

        // No subscribers is not an error
        let _ = self.events.send(record.clone());

        Ok(record)
    }

    /// Get one message
    pub async fn get_message(&self, id: i64) -> Result<MessageRecord> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_MESSAGE))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        match row {
            Some(row) => row_to_record(row),
            None => Err(SpamError::NotFound(format!("message {}", id))),
        }
    }

    /// All messages, oldest first
    pub async fn list_messages(&self) -> Result<Vec<MessageRecord>> {
        let rows = sqlx::query(&format!("{} ORDER BY id", SELECT_MESSAGE))
            .fetch_all(&self.db)
            .await?;

        rows.into_iter().map(row_to_record).collect()
    }

    /// Messages currently flagged as spam, newest classification first
    pub async fn list_spam(&self) -> Result<Vec<MessageRecord>> {
        let rows = sqlx::query(&format!(
            "{} WHERE is_spam = 1 ORDER BY classified_at DESC, id DESC",
            SELECT_MESSAGE
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(row_to_record).collect()
    }

    /// Record a human label and train the engine with it.
    ///
    /// Labeling the same message again trains it again.
    pub async fn label_message(&self, id: i64, label: Label) -> Result<MessageRecord> {
        if label == Label::Unknown {
            return Err(SpamError::InvalidLabel(
                "a message can only be labeled SPAM or HAM".to_string(),
            ));
        }

        let mut record = self.get_message(id).await?;

        self.engine.train(&record.text(), label).await?;

        record.label = label;
        record.is_spam = Some(label == Label::Spam);

        sqlx::query("UPDATE messages SET label = ?, is_spam = ? WHERE id = ?")
            .bind(label.as_str())
            .bind(record.is_spam)
            .bind(id)
            .execute(&self.db)
            .await?;

        info!("Message {} labeled {}", id, label);

        Ok(record)
    }

    /// Release a message from spam: label it HAM
    pub async fn move_to_inbox(&self, id: i64) -> Result<MessageRecord> {
        self.label_message(id, Label::Ham).await
    }

    /// Delete a message record. Statistics it contributed are kept.
    pub async fn delete_message(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(SpamError::NotFound(format!("message {}", id)));
        }

        Ok(())
    }
}

fn row_to_record(row: sqlx::sqlite::SqliteRow) -> Result<MessageRecord> {
    use sqlx::Row;

    let label: String = row.try_get("label")?;
    let classified_at: Option<String> = row.try_get("classified_at")?;

    Ok(MessageRecord {
        id: row.try_get("id")?,
        sender: row.try_get("sender")?,
        subject: row.try_get("subject")?,
        body: row.try_get("body")?,
        label: label.parse()?,
        is_spam: row.try_get("is_spam")?,
        score: row.try_get("score")?,
        probability: row.try_get("probability")?,
        classified_at: classified_at
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|d| d.with_timezone(&Utc))
                    .map_err(|e| SpamError::Parse(e.to_string()))
            })
            .transpose()?,
    })
}
