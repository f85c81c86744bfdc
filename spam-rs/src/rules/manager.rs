//! Rule manager for database persistence

use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use super::types::{evaluate, NewRule, Rule, RuleVerdict};
use crate::error::{Result, SpamError};

/// Stores keyword and sender rules
pub struct RuleManager {
    db: SqlitePool,
}

impl RuleManager {
    /// Create a new rule manager
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Initialize database tables
    pub async fn init_db(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rules (
                id TEXT PRIMARY KEY,
                rule_type TEXT NOT NULL,
                value TEXT NOT NULL,
                action TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// List all rules, oldest first
    pub async fn list_rules(&self) -> Result<Vec<Rule>> {
        let rows = sqlx::query_as::<_, (String, String, String, String)>(
            "SELECT id, rule_type, value, action FROM rules ORDER BY created_at, id",
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|(id, rule_type, value, action)| -> Result<Rule> {
                Ok(Rule {
                    id,
                    rule_type: rule_type.parse()?,
                    value,
                    action: action.parse()?,
                })
            })
            .collect()
    }

    /// Create a rule
    pub async fn create_rule(&self, rule: NewRule) -> Result<Rule> {
        let value = rule.value.trim().to_string();
        if value.is_empty() {
            return Err(SpamError::Parse("rule value must not be empty".to_string()));
        }

        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO rules (id, rule_type, value, action, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(rule.rule_type.as_str())
        .bind(&value)
        .bind(rule.action.as_str())
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.db)
        .await?;

        info!(
            "Created {} rule '{}' -> {}",
            rule.rule_type.as_str(),
            value,
            rule.action.as_str()
        );

        Ok(Rule {
            id,
            rule_type: rule.rule_type,
            value,
            action: rule.action,
        })
    }

    /// Delete a rule
    pub async fn delete_rule(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM rules WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(SpamError::NotFound(format!("rule {}", id)));
        }

        Ok(())
    }

    /// Run every stored rule over a message
    pub async fn evaluate(&self, sender: &str, subject: &str, body: &str) -> Result<Option<RuleVerdict>> {
        let rules = self.list_rules().await?;
        Ok(evaluate(&rules, sender, subject, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::db;
    use crate::rules::{RuleAction, RuleType};

    async fn setup_manager() -> RuleManager {
        let pool = db::connect(&StorageConfig::in_memory()).await.unwrap();
        let manager = RuleManager::new(pool);
        manager.init_db().await.unwrap();
        manager
    }

    #[tokio::test]
    async fn test_create_list_delete() {
        let manager = setup_manager().await;

        let rule = manager
            .create_rule(NewRule {
                rule_type: RuleType::Sender,
                value: "  promo@deals.biz ".to_string(),
                action: RuleAction::MarkSpam,
            })
            .await
            .unwrap();
        assert_eq!(rule.value, "promo@deals.biz");

        let rules = manager.list_rules().await.unwrap();
        assert_eq!(rules, vec![rule.clone()]);

        manager.delete_rule(&rule.id).await.unwrap();
        assert!(manager.list_rules().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_rule() {
        let manager = setup_manager().await;
        let result = manager.delete_rule("nope").await;
        assert!(matches!(result, Err(SpamError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_value_rejected() {
        let manager = setup_manager().await;
        let result = manager
            .create_rule(NewRule {
                rule_type: RuleType::Keyword,
                value: "   ".to_string(),
                action: RuleAction::MarkSpam,
            })
            .await;
        assert!(matches!(result, Err(SpamError::Parse(_))));
    }

    #[tokio::test]
    async fn test_evaluate_from_database() {
        let manager = setup_manager().await;
        manager
            .create_rule(NewRule {
                rule_type: RuleType::Keyword,
                value: "crypto".to_string(),
                action: RuleAction::MarkSpam,
            })
            .await
            .unwrap();

        let verdict = manager
            .evaluate("x@y.com", "Crypto gains", "")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(verdict.action, RuleAction::MarkSpam);

        assert!(manager.evaluate("x@y.com", "lunch", "").await.unwrap().is_none());
    }
}
