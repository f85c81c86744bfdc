//! Rule types

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::SpamError;

/// What part of a message a rule looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleType {
    /// Substring of subject or body
    Keyword,
    /// Substring of the sender address
    Sender,
}

/// What happens when a rule matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleAction {
    MarkSpam,
    Allow,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Keyword => "KEYWORD",
            RuleType::Sender => "SENDER",
        }
    }
}

impl FromStr for RuleType {
    type Err = SpamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "KEYWORD" => Ok(RuleType::Keyword),
            "SENDER" => Ok(RuleType::Sender),
            other => Err(SpamError::Parse(format!("unknown rule type '{}'", other))),
        }
    }
}

impl RuleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleAction::MarkSpam => "MARK_SPAM",
            RuleAction::Allow => "ALLOW",
        }
    }
}

impl FromStr for RuleAction {
    type Err = SpamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "MARK_SPAM" => Ok(RuleAction::MarkSpam),
            "ALLOW" => Ok(RuleAction::Allow),
            other => Err(SpamError::Parse(format!("unknown rule action '{}'", other))),
        }
    }
}

/// A stored keyword or sender rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub rule_type: RuleType,
    /// Text to look for, matched case-insensitively
    pub value: String,
    pub action: RuleAction,
}

/// Rule fields supplied when creating a rule
#[derive(Debug, Clone, Deserialize)]
pub struct NewRule {
    pub rule_type: RuleType,
    pub value: String,
    pub action: RuleAction,
}

/// Outcome of running the rule list over a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleVerdict {
    pub rule_id: String,
    pub action: RuleAction,
}

impl Rule {
    /// Does this rule fire for the given message fields
    pub fn matches(&self, sender: &str, subject: &str, body: &str) -> bool {
        let needle = self.value.to_lowercase();
        if needle.is_empty() {
            return false;
        }

        match self.rule_type {
            RuleType::Sender => sender.to_lowercase().contains(&needle),
            RuleType::Keyword => {
                subject.to_lowercase().contains(&needle) || body.to_lowercase().contains(&needle)
            }
        }
    }
}

/// First matching ALLOW rule, else first matching MARK_SPAM rule
pub fn evaluate(rules: &[Rule], sender: &str, subject: &str, body: &str) -> Option<RuleVerdict> {
    let mut mark_spam = None;

    for rule in rules.iter().filter(|r| r.matches(sender, subject, body)) {
        match rule.action {
            RuleAction::Allow => {
                return Some(RuleVerdict {
                    rule_id: rule.id.clone(),
                    action: RuleAction::Allow,
                })
            }
            RuleAction::MarkSpam => {
                mark_spam.get_or_insert_with(|| RuleVerdict {
                    rule_id: rule.id.clone(),
                    action: RuleAction::MarkSpam,
                });
            }
        }
    }

    mark_spam
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str, rule_type: RuleType, value: &str, action: RuleAction) -> Rule {
        Rule {
            id: id.to_string(),
            rule_type,
            value: value.to_string(),
            action,
        }
    }

    #[test]
    fn test_sender_rule_matches_sender_only() {
        let r = rule("1", RuleType::Sender, "@Casino.com", RuleAction::MarkSpam);
        assert!(r.matches("vip@casino.com", "", ""));
        assert!(!r.matches("friend@home.org", "casino.com deals", "casino.com"));
    }

    #[test]
    fn test_keyword_rule_matches_subject_or_body() {
        let r = rule("1", RuleType::Keyword, "lottery", RuleAction::MarkSpam);
        assert!(r.matches("", "You won the LOTTERY", ""));
        assert!(r.matches("", "", "claim your lottery prize"));
        assert!(!r.matches("lottery@corp.com", "hello", "hi"));
    }

    #[test]
    fn test_empty_value_never_matches() {
        let r = rule("1", RuleType::Keyword, "", RuleAction::MarkSpam);
        assert!(!r.matches("a@b.com", "subject", "body"));
    }

    #[test]
    fn test_allow_wins_over_mark_spam() {
        let rules = vec![
            rule("spam", RuleType::Keyword, "invoice", RuleAction::MarkSpam),
            rule("boss", RuleType::Sender, "boss@corp.com", RuleAction::Allow),
        ];

        let verdict = evaluate(&rules, "boss@corp.com", "invoice attached", "").unwrap();
        assert_eq!(verdict.action, RuleAction::Allow);
        assert_eq!(verdict.rule_id, "boss");

        let verdict = evaluate(&rules, "billing@scam.biz", "invoice attached", "").unwrap();
        assert_eq!(verdict.action, RuleAction::MarkSpam);

        assert!(evaluate(&rules, "x@y.com", "hello", "").is_none());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("keyword".parse::<RuleType>().unwrap(), RuleType::Keyword);
        assert_eq!("mark-spam".parse::<RuleAction>().unwrap(), RuleAction::MarkSpam);
        assert_eq!("ALLOW".parse::<RuleAction>().unwrap(), RuleAction::Allow);
        assert!("block".parse::<RuleAction>().is_err());
    }
}
