//! Quid CLI - Bank statement processor
//!
//! Usage:
//!   quid init                       Initialize database
//!   quid process --file stmt.pdf    Parse and categorize a statement
//!   quid rules test "TESCO 3401"    Dry-run the rule layer
//!   quid serve --port 3000          Start the REST API

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let db_path = commands::resolve_db_path(cli.db.as_deref());

    match cli.command {
        Commands::Init => commands::cmd_init(&db_path),
        Commands::Process {
            file,
            entity,
            mode,
            json,
        } => {
            let db = commands::open_db(&db_path)?;
            commands::cmd_process(&db, &file, entity, &mode, json).await
        }
        Commands::Categorize {
            description,
            amount,
            transaction_type,
            entity,
        } => {
            let db = commands::open_db(&db_path)?;
            commands::cmd_categorize(&db, &description, amount, &transaction_type, entity).await
        }
        Commands::Rules { action } => {
            let db = commands::open_db(&db_path)?;
            match action {
                None | Some(RulesAction::List { regime: None }) => {
                    commands::cmd_rules_list(&db, None)
                }
                Some(RulesAction::List { regime }) => {
                    commands::cmd_rules_list(&db, regime.as_deref())
                }
                Some(RulesAction::Add {
                    keyword,
                    category,
                    regime,
                    match_type,
                    transaction_type,
                    priority,
                }) => commands::cmd_rules_add(
                    &db,
                    &keyword,
                    &category,
                    &regime,
                    &match_type,
                    transaction_type.as_deref(),
                    priority,
                ),
                Some(RulesAction::Delete { id }) => commands::cmd_rules_delete(&db, id),
                Some(RulesAction::Test {
                    description,
                    regime,
                }) => commands::cmd_rules_test(&db, &description, &regime).await,
            }
        }
        Commands::Entities { action } => {
            let db = commands::open_db(&db_path)?;
            match action {
                None | Some(EntitiesAction::List) => commands::cmd_entities_list(&db),
                Some(EntitiesAction::Add {
                    name,
                    entity_type,
                    utr,
                    vat,
                }) => commands::cmd_entities_add(
                    &db,
                    &name,
                    &entity_type,
                    utr.as_deref(),
                    vat.as_deref(),
                ),
            }
        }
        Commands::Serve { port, host } => {
            let db = commands::open_db(&db_path)?;
            commands::cmd_serve(db, &db_path, &host, port).await
        }
        Commands::Status => commands::cmd_status(&db_path),
    }
}
