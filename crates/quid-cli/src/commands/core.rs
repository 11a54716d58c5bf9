//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `resolve_db_path` / `open_db` - Database location and opening
//! - `cmd_init` - Initialize the database
//! - `cmd_status` - Show database status
//! - `cmd_serve` - Start the web server

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use quid_core::ai::AIBackend;
use quid_core::db::Database;

/// Environment variable overriding the database location.
pub const DB_PATH_ENV: &str = "QUID_DB";

/// Where the database lives: --db flag, then QUID_DB, then the platform
/// data directory.
pub fn resolve_db_path(flag: Option<&Path>) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        return PathBuf::from(path);
    }
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quid")
        .join("quid.db")
}

/// Open the database, creating its parent directory if needed.
pub fn open_db(db_path: &Path) -> Result<Database> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    Database::new(db_path).context("Failed to open database")
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;

    let hmrc = db.list_categories(quid_core::models::TaxRegime::Hmrc)?;
    let ch = db.list_categories(quid_core::models::TaxRegime::CompaniesHouse)?;
    println!(
        "   Seeded {} HMRC and {} Companies House categories",
        hmrc.len(),
        ch.len()
    );

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Process a statement: quid process --file statement.pdf");
    println!("  2. Start the API server: quid serve");

    Ok(())
}

pub fn cmd_status(db_path: &Path) -> Result<()> {
    use std::fs;

    println!();
    println!("📊 Quid Status");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Database: {}", db_path.display());

    if db_path.exists() {
        if let Ok(metadata) = fs::metadata(db_path) {
            let size_kb = metadata.len() as f64 / 1024.0;
            if size_kb < 1024.0 {
                println!("   Size: {:.1} KB", size_kb);
            } else {
                println!("   Size: {:.1} MB", size_kb / 1024.0);
            }
        }
    } else {
        println!("   Size: (database not initialized)");
    }

    if db_path.exists() {
        match open_db(db_path) {
            Ok(db) => {
                let metrics = db.categorization_metrics()?;
                let entities = db.list_entities()?;
                println!();
                println!("   Entities: {}", entities.len());
                println!(
                    "   Rules: {} active ({} system, {} user, {} learned)",
                    metrics.total_rules,
                    metrics.system_rules,
                    metrics.user_rules,
                    metrics.auto_learned_rules
                );
                println!("   Corrections recorded: {}", metrics.total_feedback);
            }
            Err(e) => {
                println!();
                println!("   ❌ Error opening database: {}", e);
            }
        }
    }

    println!();
    match std::env::var("DOCLING_URL") {
        Ok(url) => println!("   Docling extraction: {}", url),
        Err(_) => println!("   Docling extraction: not configured (PDFs use pdftotext)"),
    }
    match quid_core::ai::AIClient::from_env() {
        Some(client) => println!(
            "   AI backend: {} (model: {})",
            client.host(),
            client.model()
        ),
        None => println!("   AI backend: not configured"),
    }
    println!();

    Ok(())
}

pub async fn cmd_serve(db: Database, db_path: &Path, host: &str, port: u16) -> Result<()> {
    println!("🚀 Starting Quid API server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);
    println!();

    quid_server::serve(db, host, port).await
}
