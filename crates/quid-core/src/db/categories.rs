//! Category taxonomy queries.

use rusqlite::params;

use super::seed::{CH_CATEGORIES, HMRC_CATEGORIES};
use super::Database;
use crate::error::{Error, Result};
use crate::models::{Category, CategoryType, TaxRegime};

impl Database {
    pub(super) fn seed_categories(&self) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO categories (name, type, regime) VALUES (?1, ?2, ?3)",
            )?;
            for (regime, cats) in [
                (TaxRegime::Hmrc, HMRC_CATEGORIES),
                (TaxRegime::CompaniesHouse, CH_CATEGORIES),
            ] {
                for (name, cat_type) in cats {
                    stmt.execute(params![name, cat_type.as_str(), regime.as_str()])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// All categories for a regime, income first then expenses, alphabetical
    /// within each type.
    pub fn list_categories(&self, regime: TaxRegime) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, type, regime FROM categories
             WHERE regime = ?1
             ORDER BY type DESC, name ASC",
        )?;
        let rows = stmt.query_map(params![regime.as_str()], row_to_category)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn get_category(&self, id: i64) -> Result<Category> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, name, type, regime FROM categories WHERE id = ?1",
            params![id],
            row_to_category,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                Error::NotFound(format!("category {}", id))
            }
            other => other.into(),
        })
    }

    pub fn get_category_by_name(&self, name: &str, regime: TaxRegime) -> Result<Category> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, name, type, regime FROM categories WHERE name = ?1 AND regime = ?2",
            params![name, regime.as_str()],
            row_to_category,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                Error::NotFound(format!("category '{}' in {}", name, regime))
            }
            other => other.into(),
        })
    }
}

fn row_to_category(row: &rusqlite::Row) -> rusqlite::Result<Category> {
    let type_str: String = row.get(2)?;
    let regime_str: String = row.get(3)?;
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        category_type: type_str.parse().unwrap_or(CategoryType::Expense),
        regime: regime_str.parse().unwrap_or_default(),
    })
}
