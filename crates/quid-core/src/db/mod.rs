//! SQLite persistence layer.
//!
//! A single `Database` handle wraps an r2d2 connection pool over a bundled
//! SQLite file. Migrations run on open and are idempotent; the category
//! taxonomies and built-in keyword rules are seeded on first run.

mod categories;
mod entities;
mod feedback;
mod rules;
mod seed;

pub use seed::{CH_CATEGORIES, CH_KEYWORDS, HMRC_CATEGORIES, HMRC_KEYWORDS};

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::error::Result;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = r2d2::PooledConnection<SqliteConnectionManager>;

#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    db_path: String,
}

impl Database {
    /// Open (or create) the database at `path` and bring the schema up to date.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db_path = path.as_ref().to_string_lossy().to_string();
        let manager = SqliteConnectionManager::file(path.as_ref());
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self { pool, db_path };
        db.run_migrations()?;
        db.seed()?;
        Ok(db)
    }

    /// Fresh throwaway database for tests. Uses a tmp file rather than
    /// `:memory:` so every pooled connection sees the same database.
    #[doc(hidden)]
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "quid_test_{}_{}.db",
            std::process::id(),
            n
        ));
        let _ = std::fs::remove_file(&path);
        Self::new(path)
    }

    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    pub fn path(&self) -> &str {
        &self.db_path
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA cache_size = 2000;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;

            -- Tax entities a statement can be processed against. entity_type
            -- determines the tax regime (limited_company / llp / partnership
            -- map to companies_house, everything else to hmrc).
            CREATE TABLE IF NOT EXISTS entities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                entity_type TEXT NOT NULL DEFAULT 'individual',
                ni_number TEXT,
                utr TEXT,
                vat_number TEXT,
                user_id TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- Closed per-regime category taxonomies. Seeded on first run;
            -- names are unique within a regime, not across regimes.
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
                regime TEXT NOT NULL CHECK (regime IN ('hmrc', 'companies_house')),
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE (name, regime)
            );

            -- Keyword rules, layer 1 of the categorization engine.
            -- source: system (seeded), user (created by hand), auto_learned
            -- (created by the feedback loop). entity_id scopes a rule to one
            -- entity; NULL entity_id + NULL user_id means system-wide.
            CREATE TABLE IF NOT EXISTS categorization_rules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                keyword TEXT NOT NULL,
                match_type TEXT NOT NULL DEFAULT 'contains'
                    CHECK (match_type IN ('contains', 'exact', 'starts_with')),
                category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                transaction_type TEXT CHECK (transaction_type IN ('credit', 'debit')),
                priority INTEGER NOT NULL DEFAULT 10,
                source TEXT NOT NULL DEFAULT 'user'
                    CHECK (source IN ('system', 'user', 'auto_learned')),
                confidence REAL NOT NULL DEFAULT 1.0,
                auto_approve INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                user_id TEXT,
                entity_id INTEGER REFERENCES entities(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE INDEX IF NOT EXISTS idx_rules_active
                ON categorization_rules(is_active, priority);
            CREATE INDEX IF NOT EXISTS idx_rules_entity
                ON categorization_rules(entity_id);

            -- User corrections. Layer 2 (pattern matching) reads recent rows;
            -- the feedback loop promotes repeated corrections into rules.
            CREATE TABLE IF NOT EXISTS categorization_feedback (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                transaction_description TEXT NOT NULL,
                transaction_type TEXT NOT NULL CHECK (transaction_type IN ('credit', 'debit')),
                amount REAL,
                suggested_category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
                corrected_category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                user_id TEXT,
                entity_id INTEGER REFERENCES entities(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE INDEX IF NOT EXISTS idx_feedback_created
                ON categorization_feedback(created_at);
            "#,
        )?;

        Ok(())
    }

    /// Seed the category taxonomies and built-in keyword rules. Idempotent:
    /// skipped entirely once categories exist.
    fn seed(&self) -> Result<()> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        tracing::info!("seeding category taxonomies and system rules");
        self.seed_categories()?;
        self.seed_system_rules()?;
        Ok(())
    }
}

/// Parse a SQLite `datetime('now')` timestamp into a UTC datetime.
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let db = Database::in_memory().unwrap();
        db.run_migrations().unwrap();
        db.run_migrations().unwrap();
    }

    #[test]
    fn test_seed_runs_once() {
        let db = Database::in_memory().unwrap();
        let before: i64 = db
            .conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))
            .unwrap();
        assert!(before > 0);

        db.seed().unwrap();
        let after: i64 = db
            .conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))
            .unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_parse_datetime() {
        let dt = parse_datetime("2025-03-14 09:26:53");
        assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), "2025-03-14 09:26:53");
    }
}
