//! Categorization rule storage.

use rusqlite::params;

use super::seed::{CH_KEYWORDS, HMRC_KEYWORDS};
use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{
    CategorizationRule, CategoryType, MatchType, NewRule, RuleSource, TaxRegime, TransactionType,
};

const RULE_COLUMNS: &str = "r.id, r.keyword, r.match_type, r.category_id, c.name, c.type,
             r.transaction_type, r.priority, r.source, r.confidence,
             r.auto_approve, r.is_active, r.user_id, r.entity_id, r.created_at";

impl Database {
    /// Seed built-in keyword rules from the per-regime keyword tables.
    /// Income categories get a credit-only constraint, expenses debit-only,
    /// so "salary" never matches an outgoing payment. Multi-word keywords
    /// are more specific and outrank single-word ones ("director salary"
    /// must beat "salary").
    pub(super) fn seed_system_rules(&self) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO categorization_rules
                     (keyword, match_type, category_id, transaction_type,
                      priority, source, confidence, auto_approve)
                 SELECT ?1, 'contains', id,
                        CASE type WHEN 'income' THEN 'credit' ELSE 'debit' END,
                        CASE WHEN ?1 LIKE '% %' THEN 15 ELSE 10 END,
                        'system', 1.0, 1
                 FROM categories WHERE name = ?2 AND regime = ?3",
            )?;
            for (regime, table) in [
                (TaxRegime::Hmrc, HMRC_KEYWORDS),
                (TaxRegime::CompaniesHouse, CH_KEYWORDS),
            ] {
                for (category_name, keywords) in table {
                    for keyword in *keywords {
                        stmt.execute(params![keyword, category_name, regime.as_str()])?;
                    }
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Active rules visible to a categorization run: system rules plus any
    /// owned by the user or scoped to the entity, restricted to the regime's
    /// taxonomy. Highest priority first; among equals the newest rule wins.
    pub fn list_active_rules(
        &self,
        regime: TaxRegime,
        user_id: Option<&str>,
        entity_id: Option<i64>,
    ) -> Result<Vec<CategorizationRule>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {RULE_COLUMNS}
             FROM categorization_rules r
             JOIN categories c ON c.id = r.category_id
             WHERE r.is_active = 1
               AND c.regime = ?1
               AND (r.source = 'system'
                    OR (?2 IS NOT NULL AND r.user_id = ?2)
                    OR (?3 IS NOT NULL AND r.entity_id = ?3))
             ORDER BY r.priority DESC, r.created_at DESC, r.id DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![regime.as_str(), user_id, entity_id], row_to_rule)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn list_rules(&self, regime: Option<TaxRegime>) -> Result<Vec<CategorizationRule>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {RULE_COLUMNS}
             FROM categorization_rules r
             JOIN categories c ON c.id = r.category_id
             WHERE (?1 IS NULL OR c.regime = ?1)
             ORDER BY r.priority DESC, r.created_at DESC, r.id DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![regime.map(|r| r.as_str())], row_to_rule)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn create_rule(&self, rule: &NewRule) -> Result<CategorizationRule> {
        // The category must exist; this also pins down the regime the rule
        // will apply under.
        self.get_category(rule.category_id)?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO categorization_rules
                 (keyword, match_type, category_id, transaction_type, priority,
                  source, confidence, auto_approve, user_id, entity_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                rule.keyword.trim().to_lowercase(),
                rule.match_type.as_str(),
                rule.category_id,
                rule.transaction_type.map(|t| t.as_str()),
                rule.priority,
                rule.source.as_str(),
                rule.confidence,
                rule.auto_approve,
                rule.user_id,
                rule.entity_id,
            ],
        )?;
        self.get_rule(conn.last_insert_rowid())
    }

    pub fn get_rule(&self, id: i64) -> Result<CategorizationRule> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {RULE_COLUMNS}
             FROM categorization_rules r
             JOIN categories c ON c.id = r.category_id
             WHERE r.id = ?1"
        );
        conn.query_row(&sql, params![id], row_to_rule).map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound(format!("rule {}", id)),
            other => other.into(),
        })
    }

    /// Soft-delete: the rule stops matching but stays for audit.
    pub fn deactivate_rule(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE categorization_rules SET is_active = 0 WHERE id = ?1 AND is_active = 1",
            params![id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("rule {}", id)));
        }
        Ok(())
    }

    /// Does an active auto-learned rule for this keyword/category pair exist
    /// already? Used by the feedback loop to avoid duplicates.
    pub fn has_learned_rule(&self, keyword: &str, category_id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM categorization_rules
             WHERE keyword = ?1 AND category_id = ?2
               AND source = 'auto_learned' AND is_active = 1",
            params![keyword, category_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

fn row_to_rule(row: &rusqlite::Row) -> rusqlite::Result<CategorizationRule> {
    let match_type: String = row.get(2)?;
    let cat_type: String = row.get(5)?;
    let tx_type: Option<String> = row.get(6)?;
    let source: String = row.get(8)?;
    let created_at: String = row.get(14)?;
    Ok(CategorizationRule {
        id: row.get(0)?,
        keyword: row.get(1)?,
        match_type: match_type.parse().unwrap_or(MatchType::Contains),
        category_id: row.get(3)?,
        category_name: row.get(4)?,
        category_type: cat_type.parse().unwrap_or(CategoryType::Expense),
        transaction_type: tx_type.and_then(|t| t.parse::<TransactionType>().ok()),
        priority: row.get(7)?,
        source: source.parse().unwrap_or(RuleSource::User),
        confidence: row.get(9)?,
        auto_approve: row.get(10)?,
        is_active: row.get(11)?,
        user_id: row.get(12)?,
        entity_id: row.get(13)?,
        created_at: parse_datetime(&created_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_rules_seeded_per_regime() {
        let db = Database::in_memory().unwrap();

        let hmrc = db.list_active_rules(TaxRegime::Hmrc, None, None).unwrap();
        let ch = db
            .list_active_rules(TaxRegime::CompaniesHouse, None, None)
            .unwrap();
        assert!(!hmrc.is_empty());
        assert!(!ch.is_empty());
        assert!(hmrc.iter().all(|r| r.source == RuleSource::System));

        // "tesco" belongs to the HMRC table only
        assert!(hmrc.iter().any(|r| r.keyword == "tesco"));
        assert!(!ch.iter().any(|r| r.keyword == "tesco"));

        // Multi-word keywords outrank single-word ones
        let director = ch.iter().find(|r| r.keyword == "director salary").unwrap();
        let salary = ch.iter().find(|r| r.keyword == "salary").unwrap();
        assert!(director.priority > salary.priority);
        assert_eq!(director.category_name, "Directors Remuneration");
    }

    #[test]
    fn test_seeded_income_rules_are_credit_only() {
        let db = Database::in_memory().unwrap();
        let rules = db.list_active_rules(TaxRegime::Hmrc, None, None).unwrap();
        let salary = rules.iter().find(|r| r.keyword == "salary").unwrap();
        assert_eq!(salary.category_name, "Salary");
        assert_eq!(salary.transaction_type, Some(TransactionType::Credit));

        let tesco = rules.iter().find(|r| r.keyword == "tesco").unwrap();
        assert_eq!(tesco.transaction_type, Some(TransactionType::Debit));
    }

    #[test]
    fn test_user_rules_scoped_to_owner() {
        let db = Database::in_memory().unwrap();
        let groceries = db
            .get_category_by_name("Groceries", TaxRegime::Hmrc)
            .unwrap();

        let rule = db
            .create_rule(&NewRule {
                keyword: "  Corner Shop ".into(),
                user_id: Some("alice".into()),
                ..NewRule::for_category(groceries.id)
            })
            .unwrap();
        assert_eq!(rule.keyword, "corner shop");

        let alice = db
            .list_active_rules(TaxRegime::Hmrc, Some("alice"), None)
            .unwrap();
        assert!(alice.iter().any(|r| r.id == rule.id));

        let bob = db
            .list_active_rules(TaxRegime::Hmrc, Some("bob"), None)
            .unwrap();
        assert!(!bob.iter().any(|r| r.id == rule.id));
    }

    #[test]
    fn test_priority_then_recency_ordering() {
        let db = Database::in_memory().unwrap();
        let groceries = db
            .get_category_by_name("Groceries", TaxRegime::Hmrc)
            .unwrap();
        let shopping = db
            .get_category_by_name("Shopping", TaxRegime::Hmrc)
            .unwrap();

        let low = db
            .create_rule(&NewRule {
                keyword: "market".into(),
                priority: 1,
                user_id: Some("alice".into()),
                ..NewRule::for_category(groceries.id)
            })
            .unwrap();
        let high = db
            .create_rule(&NewRule {
                keyword: "market".into(),
                priority: 50,
                user_id: Some("alice".into()),
                ..NewRule::for_category(shopping.id)
            })
            .unwrap();

        let rules = db
            .list_active_rules(TaxRegime::Hmrc, Some("alice"), None)
            .unwrap();
        let pos_high = rules.iter().position(|r| r.id == high.id).unwrap();
        let pos_low = rules.iter().position(|r| r.id == low.id).unwrap();
        assert!(pos_high < pos_low);
    }

    #[test]
    fn test_deactivate_rule() {
        let db = Database::in_memory().unwrap();
        let groceries = db
            .get_category_by_name("Groceries", TaxRegime::Hmrc)
            .unwrap();
        let rule = db
            .create_rule(&NewRule {
                keyword: "farm shop".into(),
                user_id: Some("alice".into()),
                ..NewRule::for_category(groceries.id)
            })
            .unwrap();

        db.deactivate_rule(rule.id).unwrap();
        let rules = db
            .list_active_rules(TaxRegime::Hmrc, Some("alice"), None)
            .unwrap();
        assert!(!rules.iter().any(|r| r.id == rule.id));

        // Deactivating twice is NotFound, as is a made-up id
        assert!(matches!(
            db.deactivate_rule(rule.id),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            db.deactivate_rule(999_999),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_create_rule_rejects_unknown_category() {
        let db = Database::in_memory().unwrap();
        let err = db
            .create_rule(&NewRule {
                keyword: "whatever".into(),
                ..NewRule::for_category(999_999)
            })
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
