//! spam-rs command line
//!
//! # Usage
//!
//! ```bash
//! # Score a message without storing it
//! spam-rs classify --sender a@b.com --subject "win money now" --body "click here"
//!
//! # Teach the model
//! spam-rs train spam --sender a@b.com --subject "win money now"
//!
//! # Inbox workflow
//! spam-rs inbox add --sender boss@corp.com --subject "Q3 numbers"
//! spam-rs inbox label 1 ham
//! spam-rs inbox spam
//!
//! # Rules
//! spam-rs rules add sender @casino.com mark-spam
//! ```

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use spam_rs::bayes::{BayesEngine, Label, MessageText};
use spam_rs::config::Config;
use spam_rs::inbox::InboxManager;
use spam_rs::rules::{NewRule, RuleAction, RuleManager, RuleType};
use spam_rs::db;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_CONFIG: &str = "spam-rs.toml";

#[derive(Parser)]
#[command(name = "spam-rs")]
#[command(about = "Bayesian spam filter", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./spam-rs.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database URL, overrides the configuration (e.g., sqlite://spam.db)
    #[arg(short, long)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct MessageArgs {
    #[arg(long, default_value = "")]
    sender: String,
    #[arg(long, default_value = "")]
    subject: String,
    #[arg(long, default_value = "")]
    body: String,
}

impl MessageArgs {
    fn text(&self) -> MessageText<'_> {
        MessageText::new(&self.sender, &self.subject, &self.body)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Score a message without storing or training
    Classify(MessageArgs),
    /// Train the model with a labeled message
    Train {
        /// SPAM or HAM
        label: Label,
        #[command(flatten)]
        message: MessageArgs,
    },
    /// Show corpus-wide statistics
    Stats,
    /// Manage classified messages
    #[command(subcommand)]
    Inbox(InboxCommands),
    /// Manage keyword and sender rules
    #[command(subcommand)]
    Rules(RuleCommands),
}

#[derive(Subcommand)]
enum InboxCommands {
    /// Classify a message and record it
    Add(MessageArgs),
    /// List all messages
    List,
    /// List messages flagged as spam
    Spam,
    /// Label a message and train the model with it
    Label { id: i64, label: Label },
    /// Label a message as ham
    MoveToInbox { id: i64 },
    /// Delete a message record
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum RuleCommands {
    /// List all rules
    List,
    /// Add a rule
    Add {
        /// KEYWORD or SENDER
        rule_type: RuleType,
        /// Text to match, case-insensitive
        value: String,
        /// MARK_SPAM or ALLOW
        action: RuleAction,
    },
    /// Delete a rule
    Delete { id: String },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display())),
        None if Path::new(DEFAULT_CONFIG).exists() => {
            Config::from_file(DEFAULT_CONFIG).context("Failed to load spam-rs.toml")
        }
        None => Ok(Config::default()),
    }
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("spam_rs={}", config.logging.level).into());

    // Logs go to stderr; stdout carries command output
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(url) = cli.db {
        config.storage.database_url = url;
    }

    init_logging(&config);
    info!("Using database {}", config.storage.database_url);

    let pool = db::connect(&config.storage)
        .await
        .context("Failed to open database")?;
    let engine = Arc::new(BayesEngine::sqlite(pool.clone(), config.classifier.spam_threshold).await?);

    match cli.command {
        Commands::Classify(message) => {
            print_json(&engine.classify(&message.text()).await?)?;
        }
        Commands::Train { label, message } => {
            print_json(&engine.train(&message.text(), label).await?)?;
        }
        Commands::Stats => {
            print_json(&engine.stats().await?)?;
        }
        Commands::Inbox(command) => {
            let rules = Arc::new(RuleManager::new(pool.clone()));
            rules.init_db().await?;
            let inbox = InboxManager::new(pool.clone(), engine).with_rules(rules);
            inbox.init_db().await?;

            match command {
                InboxCommands::Add(message) => print_json(
                    &inbox
                        .classify_and_record(&message.sender, &message.subject, &message.body)
                        .await?,
                )?,
                InboxCommands::List => print_json(&inbox.list_messages().await?)?,
                InboxCommands::Spam => print_json(&inbox.list_spam().await?)?,
                InboxCommands::Label { id, label } => {
                    print_json(&inbox.label_message(id, label).await?)?
                }
                InboxCommands::MoveToInbox { id } => print_json(&inbox.move_to_inbox(id).await?)?,
                InboxCommands::Delete { id } => {
                    inbox.delete_message(id).await?;
                    println!("✓ Message {} deleted", id);
                }
            }
        }
        Commands::Rules(command) => {
            let rules = RuleManager::new(pool.clone());
            rules.init_db().await?;

            match command {
                RuleCommands::List => print_json(&rules.list_rules().await?)?,
                RuleCommands::Add {
                    rule_type,
                    value,
                    action,
                } => print_json(
                    &rules
                        .create_rule(NewRule {
                            rule_type,
                            value,
                            action,
                        })
                        .await?,
                )?,
                RuleCommands::Delete { id } => {
                    rules.delete_rule(&id).await?;
                    println!("✓ Rule {} deleted", id);
                }
            }
        }
    }

    pool.close().await;
    Ok(())
}
