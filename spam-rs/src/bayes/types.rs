//! Bayes engine types and data structures

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::tokenizer::tokenize;
use crate::error::SpamError;

/// Human-assigned label of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    /// Not yet reviewed. Storable, but never trained on.
    #[default]
    Unknown,
    Spam,
    Ham,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Unknown => "UNKNOWN",
            Label::Spam => "SPAM",
            Label::Ham => "HAM",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = SpamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "UNKNOWN" => Ok(Label::Unknown),
            "SPAM" => Ok(Label::Spam),
            "HAM" => Ok(Label::Ham),
            other => Err(SpamError::Parse(format!("unknown label '{}'", other))),
        }
    }
}

/// The three text fields the engine looks at. Empty fields count as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageText<'a> {
    pub sender: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
}

impl<'a> MessageText<'a> {
    pub fn new(sender: &'a str, subject: &'a str, body: &'a str) -> Self {
        Self {
            sender,
            subject,
            body,
        }
    }

    /// Tokens in sender, subject, body order, repeats kept
    pub fn tokens(&self) -> Vec<String> {
        tokenize(self.sender, self.subject, self.body)
    }
}

/// Per-token training counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStats {
    pub token: String,
    pub spam_count: u64,
    pub ham_count: u64,
}

impl TokenStats {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            spam_count: 0,
            ham_count: 0,
        }
    }
}

/// Corpus-wide counters, stored as a single row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalStats {
    /// Training calls labeled SPAM
    pub spam_messages: u64,
    /// Training calls labeled HAM
    pub ham_messages: u64,
    /// Sum of `spam_count` over all tokens
    pub total_spam_tokens: u64,
    /// Sum of `ham_count` over all tokens
    pub total_ham_tokens: u64,
    /// Number of distinct tokens ever created
    pub vocabulary_size: u64,
}

/// Result of classifying a message
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Log-odds of spam versus ham; positive favors spam
    pub score: f64,
    /// Logistic transform of `score`, in (0, 1)
    pub probability: f64,
    pub is_spam: bool,
}

impl Classification {
    pub fn from_score(score: f64, threshold: f64) -> Self {
        let probability = 1.0 / (1.0 + (-score).exp());
        Self {
            score,
            probability,
            is_spam: probability >= threshold,
        }
    }
}

/// Summary of one training call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub label: Label,
    /// Token occurrences applied, repeats included
    pub tokens: usize,
    /// Distinct tokens seen for the first time
    pub new_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parse() {
        assert_eq!("spam".parse::<Label>().unwrap(), Label::Spam);
        assert_eq!(" HAM ".parse::<Label>().unwrap(), Label::Ham);
        assert_eq!("Unknown".parse::<Label>().unwrap(), Label::Unknown);
        assert!("junk".parse::<Label>().is_err());
    }

    #[test]
    fn test_label_serde_uppercase() {
        let json = serde_json::to_string(&Label::Spam).unwrap();
        assert_eq!(json, "\"SPAM\"");
    }

    #[test]
    fn test_zero_score_is_even_odds() {
        let result = Classification::from_score(0.0, 0.9);
        assert_eq!(result.probability, 0.5);
        assert!(!result.is_spam);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // logit(0.9) lands exactly on the threshold
        let score = (0.9f64 / 0.1).ln();
        let result = Classification::from_score(score, 0.9);
        assert!((result.probability - 0.9).abs() < 1e-12);
        assert_eq!(result.is_spam, result.probability >= 0.9);

        assert!(Classification::from_score(10.0, 0.9).is_spam);
        assert!(!Classification::from_score(-10.0, 0.9).is_spam);
    }
}
