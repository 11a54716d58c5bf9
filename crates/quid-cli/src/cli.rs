//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Quid - UK bank statement ingestion and transaction categorization
#[derive(Parser)]
#[command(name = "quid")]
#[command(about = "Self-hosted bank statement processor and categorizer", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (default: QUID_DB env var, then the platform data dir)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and seed the category taxonomies
    Init,

    /// Process a bank statement file (PDF, CSV, or text)
    Process {
        /// Statement file to process
        #[arg(short, long)]
        file: PathBuf,

        /// Entity the statement belongs to; selects the tax regime
        #[arg(short, long)]
        entity: Option<i64>,

        /// Categorization mode: conservative, smart, autonomous
        #[arg(short, long, default_value = "smart")]
        mode: String,

        /// Print the full result as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Categorize a single transaction description
    Categorize {
        /// Transaction description text
        description: String,

        /// Amount in GBP
        #[arg(short, long, default_value = "0")]
        amount: f64,

        /// Transaction type: credit or debit
        #[arg(short = 't', long = "type", default_value = "debit")]
        transaction_type: String,

        /// Entity to categorize under; selects the tax regime
        #[arg(short, long)]
        entity: Option<i64>,
    },

    /// Manage categorization rules
    Rules {
        #[command(subcommand)]
        action: Option<RulesAction>,
    },

    /// Manage tax entities
    Entities {
        #[command(subcommand)]
        action: Option<EntitiesAction>,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Show database status
    Status,
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// List rules, highest priority first
    List {
        /// Filter to one regime: hmrc or companies_house
        #[arg(short, long)]
        regime: Option<String>,
    },

    /// Add a keyword rule
    Add {
        /// Keyword to match
        keyword: String,

        /// Target category name
        category: String,

        /// Regime the category belongs to: hmrc or companies_house
        #[arg(short, long, default_value = "hmrc")]
        regime: String,

        /// Match type: contains, exact, starts_with
        #[arg(short, long, default_value = "contains")]
        match_type: String,

        /// Restrict to credit or debit transactions
        #[arg(short = 't', long = "type")]
        transaction_type: Option<String>,

        /// Priority (higher wins on conflict)
        #[arg(short, long, default_value = "10")]
        priority: i64,
    },

    /// Deactivate a rule
    Delete {
        /// Rule id
        id: i64,
    },

    /// Show which rule (if any) matches a description
    Test {
        /// Description to test against the rule set
        description: String,

        /// Regime to test under: hmrc or companies_house
        #[arg(short, long, default_value = "hmrc")]
        regime: String,
    },
}

#[derive(Subcommand)]
pub enum EntitiesAction {
    /// List entities
    List,

    /// Add an entity
    Add {
        /// Entity name
        name: String,

        /// Entity type: individual, sole_trader, limited_company, llp, partnership
        #[arg(short = 't', long = "type", default_value = "individual")]
        entity_type: String,

        /// Unique Taxpayer Reference
        #[arg(long)]
        utr: Option<String>,

        /// VAT registration number
        #[arg(long)]
        vat: Option<String>,
    },
}
