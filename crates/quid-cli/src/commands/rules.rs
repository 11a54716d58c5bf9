//! Rule management commands

use anyhow::{bail, Result};
use quid_core::db::Database;
use quid_core::engine::{CategorizationEngine, CategorizationOptions};
use quid_core::models::{
    CategorizationSource, MatchType, NewRule, ParsedTransaction, TaxRegime, TransactionType,
};

use super::truncate;

pub fn cmd_rules_list(db: &Database, regime: Option<&str>) -> Result<()> {
    let regime = regime
        .map(|s| s.parse::<TaxRegime>())
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;
    let rules = db.list_rules(regime)?;

    if rules.is_empty() {
        println!("No rules found");
        return Ok(());
    }

    println!();
    println!(
        "   {:<6} {:<24} {:<12} {:<24} {:<8} {:<13} {}",
        "ID", "Keyword", "Match", "Category", "Priority", "Source", "Active"
    );
    println!("   {}", "─".repeat(96));
    for rule in &rules {
        println!(
            "   {:<6} {:<24} {:<12} {:<24} {:<8} {:<13} {}",
            rule.id,
            truncate(&rule.keyword, 24),
            rule.match_type,
            truncate(&rule.category_name, 24),
            rule.priority,
            rule.source,
            if rule.is_active { "yes" } else { "no" }
        );
    }
    println!();
    println!("   {} rules", rules.len());

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_rules_add(
    db: &Database,
    keyword: &str,
    category: &str,
    regime: &str,
    match_type: &str,
    transaction_type: Option<&str>,
    priority: i64,
) -> Result<()> {
    if keyword.trim().is_empty() {
        bail!("Rule keyword must not be empty");
    }
    let regime: TaxRegime = regime.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let match_type: MatchType = match_type.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let transaction_type = transaction_type
        .map(|s| s.parse::<TransactionType>())
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;

    let category = db.get_category_by_name(category, regime)?;
    let rule = db.create_rule(&NewRule {
        keyword: keyword.to_string(),
        match_type,
        transaction_type,
        priority,
        ..NewRule::for_category(category.id)
    })?;

    println!(
        "✅ Rule {} created: \"{}\" ({}) → {} [{}]",
        rule.id, rule.keyword, rule.match_type, rule.category_name, regime
    );
    Ok(())
}

pub fn cmd_rules_delete(db: &Database, id: i64) -> Result<()> {
    db.deactivate_rule(id)?;
    println!("✅ Rule {} deactivated", id);
    Ok(())
}

/// Dry-run the deterministic layer only: no AI backend, so anything beyond
/// rules and patterns comes back uncategorized.
pub async fn cmd_rules_test(db: &Database, description: &str, regime: &str) -> Result<()> {
    let regime: TaxRegime = regime.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let engine = CategorizationEngine::new(db.clone(), None);

    println!();
    println!("   Testing \"{}\" under {}", description, regime);
    for transaction_type in [TransactionType::Debit, TransactionType::Credit] {
        let tx = ParsedTransaction {
            date: chrono::Utc::now().date_naive(),
            description: description.to_string(),
            amount: 0.0,
            transaction_type,
            balance: None,
            reference: None,
            import_hash: String::new(),
        };
        let options = CategorizationOptions {
            regime,
            ..Default::default()
        };
        let results = engine.categorize_batch(&[tx], &options).await?;
        let result = &results[0];

        match result.source {
            CategorizationSource::Rule => println!(
                "   As {}: {} (rule {})",
                transaction_type,
                result.category_name.as_deref().unwrap_or("-"),
                result.rule_id.unwrap_or(-1)
            ),
            CategorizationSource::None => println!("   As {}: no rule matches", transaction_type),
            _ => println!(
                "   As {}: {} (via {})",
                transaction_type,
                result.category_name.as_deref().unwrap_or("-"),
                result.source
            ),
        }
    }
    println!();

    Ok(())
}
