//! Inbox types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bayes::{Label, MessageText};

/// A message the inbox has seen, with its latest classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: i64,
    pub sender: String,
    pub subject: String,
    pub body: String,
    /// Human-assigned label, UNKNOWN until reviewed
    pub label: Label,
    /// Current verdict: the model's (or a rule's) until a human labels it
    pub is_spam: Option<bool>,
    /// Log-odds from the last classification
    pub score: Option<f64>,
    /// Spam probability from the last classification
    pub probability: Option<f64>,
    pub classified_at: Option<DateTime<Utc>>,
}

impl MessageRecord {
    pub fn text(&self) -> MessageText<'_> {
        MessageText::new(&self.sender, &self.subject, &self.body)
    }
}
