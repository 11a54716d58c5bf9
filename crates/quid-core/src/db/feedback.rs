//! User-correction storage and the auto-learning loop.
//!
//! Every correction is recorded verbatim. When the same significant keyword
//! keeps being corrected to the same category, a `contains` rule is created
//! automatically so the deterministic layer handles it from then on.

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{
    CategorizationFeedback, CategorizationMetrics, MatchType, NewFeedback, NewRule, RuleSource,
    TransactionType,
};

/// Corrections containing the same keyword that must point at the same
/// category before a rule is learned.
const LEARN_THRESHOLD: i64 = 3;

/// Words too generic to learn a rule from.
const STOP_WORDS: &[&str] = &[
    "payment", "purchase", "card", "debit", "credit", "transfer", "direct", "faster", "online",
    "contactless", "with", "from", "this", "that", "limited",
];

impl Database {
    /// Record a correction, then check whether it tips any keyword over the
    /// learning threshold.
    pub fn record_feedback(&self, feedback: &NewFeedback) -> Result<(i64, bool)> {
        // Pins down the category (and so the regime) before writing.
        let category = self.get_category(feedback.corrected_category_id)?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO categorization_feedback
                 (transaction_description, transaction_type, amount,
                  suggested_category_id, corrected_category_id, user_id, entity_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                feedback.transaction_description,
                feedback.transaction_type.as_str(),
                feedback.amount,
                feedback.suggested_category_id,
                feedback.corrected_category_id,
                feedback.user_id,
                feedback.entity_id,
            ],
        )?;
        let feedback_id = conn.last_insert_rowid();
        drop(conn);

        let mut rule_created = false;
        for keyword in significant_words(&feedback.transaction_description) {
            if self.has_learned_rule(&keyword, category.id)? {
                continue;
            }
            let count = self.count_matching_corrections(&keyword, category.id)?;
            if count < LEARN_THRESHOLD {
                continue;
            }

            tracing::info!(
                keyword = %keyword,
                category = %category.name,
                corrections = count,
                "learning rule from repeated corrections"
            );
            self.create_rule(&NewRule {
                keyword: keyword.clone(),
                match_type: MatchType::Contains,
                transaction_type: Some(feedback.transaction_type),
                priority: 5,
                source: RuleSource::AutoLearned,
                confidence: 0.95,
                auto_approve: true,
                user_id: feedback.user_id.clone(),
                entity_id: feedback.entity_id,
                ..NewRule::for_category(category.id)
            })?;
            rule_created = true;
        }

        Ok((feedback_id, rule_created))
    }

    /// Most recent corrections, newest first. The pattern-matching layer
    /// reads a bounded window of these.
    pub fn list_recent_feedback(
        &self,
        user_id: Option<&str>,
        entity_id: Option<i64>,
        limit: usize,
    ) -> Result<Vec<CategorizationFeedback>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT f.id, f.transaction_description, f.transaction_type, f.amount,
                    f.suggested_category_id, f.corrected_category_id, c.name,
                    f.user_id, f.entity_id, f.created_at
             FROM categorization_feedback f
             JOIN categories c ON c.id = f.corrected_category_id
             WHERE ((?1 IS NULL AND ?2 IS NULL)
                    OR (?1 IS NOT NULL AND f.user_id = ?1)
                    OR (?2 IS NOT NULL AND f.entity_id = ?2))
             ORDER BY f.created_at DESC, f.id DESC
             LIMIT ?3",
        )?;
        let rows = stmt.query_map(params![user_id, entity_id, limit as i64], |row| {
            let tx_type: String = row.get(2)?;
            let created_at: String = row.get(9)?;
            Ok(CategorizationFeedback {
                id: row.get(0)?,
                transaction_description: row.get(1)?,
                transaction_type: tx_type.parse().unwrap_or(TransactionType::Debit),
                amount: row.get(3)?,
                suggested_category_id: row.get(4)?,
                corrected_category_id: row.get(5)?,
                corrected_category_name: row.get(6)?,
                user_id: row.get(7)?,
                entity_id: row.get(8)?,
                created_at: parse_datetime(&created_at),
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub fn categorization_metrics(&self) -> Result<CategorizationMetrics> {
        let conn = self.conn()?;
        let count = |sql: &str| -> Result<i64> {
            Ok(conn.query_row(sql, [], |row| row.get(0))?)
        };
        Ok(CategorizationMetrics {
            total_rules: count("SELECT COUNT(*) FROM categorization_rules WHERE is_active = 1")?,
            system_rules: count(
                "SELECT COUNT(*) FROM categorization_rules WHERE is_active = 1 AND source = 'system'",
            )?,
            user_rules: count(
                "SELECT COUNT(*) FROM categorization_rules WHERE is_active = 1 AND source = 'user'",
            )?,
            auto_learned_rules: count(
                "SELECT COUNT(*) FROM categorization_rules WHERE is_active = 1 AND source = 'auto_learned'",
            )?,
            total_feedback: count("SELECT COUNT(*) FROM categorization_feedback")?,
        })
    }

    fn count_matching_corrections(&self, keyword: &str, category_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM categorization_feedback
             WHERE corrected_category_id = ?1
               AND LOWER(transaction_description) LIKE '%' || ?2 || '%'",
            params![category_id, keyword],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

/// Lowercased words worth learning from: longer than 3 characters and not in
/// the stop list. Order preserved, duplicates removed.
fn significant_words(description: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for word in description
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
    {
        if word.len() > 3 && !STOP_WORDS.contains(&word) && !seen.iter().any(|w| w == word) {
            seen.push(word.to_string());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaxRegime;

    fn correction(db: &Database, description: &str, category_id: i64) -> (i64, bool) {
        db.record_feedback(&NewFeedback {
            transaction_description: description.into(),
            transaction_type: TransactionType::Debit,
            amount: Some(-12.50),
            suggested_category_id: None,
            corrected_category_id: category_id,
            user_id: Some("alice".into()),
            entity_id: None,
        })
        .unwrap()
    }

    #[test]
    fn test_significant_words() {
        let words = significant_words("CARD PAYMENT TO Bloom & Wild Ltd");
        assert_eq!(words, vec!["bloom", "wild"]);
    }

    #[test]
    fn test_third_correction_learns_a_rule() {
        let db = Database::in_memory().unwrap();
        let groceries = db
            .get_category_by_name("Groceries", TaxRegime::Hmrc)
            .unwrap();

        let (_, learned) = correction(&db, "FARMDROP ORDER 1", groceries.id);
        assert!(!learned);
        let (_, learned) = correction(&db, "FARMDROP ORDER 2", groceries.id);
        assert!(!learned);
        let (_, learned) = correction(&db, "FARMDROP ORDER 3", groceries.id);
        assert!(learned);

        let rules = db
            .list_active_rules(TaxRegime::Hmrc, Some("alice"), None)
            .unwrap();
        let rule = rules.iter().find(|r| r.keyword == "farmdrop").unwrap();
        assert_eq!(rule.source, RuleSource::AutoLearned);
        assert_eq!(rule.category_id, groceries.id);
        assert_eq!(rule.confidence, 0.95);
        assert!(rule.auto_approve);
        assert_eq!(rule.priority, 5);

        // A fourth correction must not duplicate the rule
        let (_, learned) = correction(&db, "FARMDROP ORDER 4", groceries.id);
        assert!(!learned);
    }

    #[test]
    fn test_corrections_to_different_categories_do_not_learn() {
        let db = Database::in_memory().unwrap();
        let groceries = db
            .get_category_by_name("Groceries", TaxRegime::Hmrc)
            .unwrap();
        let shopping = db
            .get_category_by_name("Shopping", TaxRegime::Hmrc)
            .unwrap();

        correction(&db, "WILKO STORE 101", groceries.id);
        correction(&db, "WILKO STORE 102", shopping.id);
        let (_, learned) = correction(&db, "WILKO STORE 103", groceries.id);
        assert!(!learned);
    }

    #[test]
    fn test_recent_feedback_scoped_and_limited() {
        let db = Database::in_memory().unwrap();
        let groceries = db
            .get_category_by_name("Groceries", TaxRegime::Hmrc)
            .unwrap();

        correction(&db, "OCADO RETAIL", groceries.id);
        db.record_feedback(&NewFeedback {
            transaction_description: "SOMEONE ELSES SHOP".into(),
            transaction_type: TransactionType::Debit,
            amount: None,
            suggested_category_id: None,
            corrected_category_id: groceries.id,
            user_id: Some("bob".into()),
            entity_id: None,
        })
        .unwrap();

        let alice = db.list_recent_feedback(Some("alice"), None, 200).unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].transaction_description, "OCADO RETAIL");
        assert_eq!(alice[0].corrected_category_name, "Groceries");

        let capped = db.list_recent_feedback(Some("alice"), None, 0).unwrap();
        assert!(capped.is_empty());
    }

    #[test]
    fn test_metrics_count_by_source() {
        let db = Database::in_memory().unwrap();
        let before = db.categorization_metrics().unwrap();
        assert!(before.system_rules > 0);
        assert_eq!(before.user_rules, 0);
        assert_eq!(before.total_feedback, 0);

        let groceries = db
            .get_category_by_name("Groceries", TaxRegime::Hmrc)
            .unwrap();
        correction(&db, "FARMDROP 1", groceries.id);
        correction(&db, "FARMDROP 2", groceries.id);
        correction(&db, "FARMDROP 3", groceries.id);

        let after = db.categorization_metrics().unwrap();
        assert_eq!(after.total_feedback, 3);
        assert_eq!(after.auto_learned_rules, 1);
        assert_eq!(after.total_rules, before.total_rules + 1);
    }
}
