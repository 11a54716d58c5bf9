//! One-off categorization command
//!
//! Runs a single description through the same 4-layer engine the pipeline
//! uses, mainly for checking what a statement import would do.

use anyhow::Result;
use chrono::Utc;
use quid_core::ai::AIClient;
use quid_core::db::Database;
use quid_core::engine::{CategorizationEngine, CategorizationOptions};
use quid_core::error::Error;
use quid_core::models::{ParsedTransaction, TaxRegime, TransactionType};

pub async fn cmd_categorize(
    db: &Database,
    description: &str,
    amount: f64,
    transaction_type: &str,
    entity_id: Option<i64>,
) -> Result<()> {
    let transaction_type: TransactionType = transaction_type
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let regime = resolve_regime(db, entity_id)?;

    let tx = ParsedTransaction {
        date: Utc::now().date_naive(),
        description: description.to_string(),
        amount: amount.abs(),
        transaction_type,
        balance: None,
        reference: None,
        import_hash: String::new(),
    };

    let engine = CategorizationEngine::new(db.clone(), AIClient::from_env());
    let options = CategorizationOptions {
        user_id: None,
        entity_id,
        regime,
        ..Default::default()
    };
    let results = engine.categorize_batch(&[tx], &options).await?;
    let result = &results[0];

    println!();
    println!("   Description: {}", description);
    println!("   Regime: {}", regime);
    match result.category_name {
        Some(ref name) => {
            println!("   Category: {} (id {})", name, result.category_id.unwrap_or(-1));
            println!("   Source: {}   Confidence: {:.2}", result.source, result.confidence);
            println!("   {}", result.reasoning);
            if result.needs_review {
                println!("   ⚠  Would be flagged for review");
            }
        }
        None => {
            println!("   Category: (none)");
            println!("   Nothing matched; the transaction would be flagged for review");
        }
    }
    println!();

    Ok(())
}

/// Same defaulting the pipeline uses: unknown or missing entities fall back
/// to the HMRC taxonomy.
pub fn resolve_regime(db: &Database, entity_id: Option<i64>) -> Result<TaxRegime> {
    let Some(id) = entity_id else {
        return Ok(TaxRegime::Hmrc);
    };
    match db.get_entity(id) {
        Ok(entity) => Ok(TaxRegime::for_entity_type(entity.entity_type)),
        Err(Error::NotFound(_)) => Ok(TaxRegime::Hmrc),
        Err(err) => Err(err.into()),
    }
}
