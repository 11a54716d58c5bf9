//! Statement processing command

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use quid_core::ai::AIClient;
use quid_core::db::Database;
use quid_core::extract::{DoclingClient, SubprocessPdfExtractor};
use quid_core::models::{CategorizationMode, ParseStatus, StatementOutcome};
use quid_core::pipeline::{ProcessRequest, StatementProcessor};

use super::truncate;

pub async fn cmd_process(
    db: &Database,
    file: &Path,
    entity_id: Option<i64>,
    mode: &str,
    json: bool,
) -> Result<()> {
    let mode: CategorizationMode = mode.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "statement".to_string());

    let processor = StatementProcessor::new(
        db.clone(),
        AIClient::from_env(),
        DoclingClient::from_env(),
        Arc::new(SubprocessPdfExtractor::new()),
    );
    let request = ProcessRequest {
        filename,
        content_type: None,
        entity_id,
        user_id: None,
        mode,
    };

    let outcome = processor.process(&bytes, &request).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return match outcome.parse_status {
            ParseStatus::Failed => bail!("statement processing failed"),
            _ => Ok(()),
        };
    }

    print_outcome(&outcome);
    if outcome.parse_status == ParseStatus::Failed {
        bail!(
            "statement processing failed: {}",
            outcome.parse_error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn print_outcome(outcome: &StatementOutcome) {
    match outcome.parse_status {
        ParseStatus::Success => println!("✅ Parsed successfully"),
        ParseStatus::NeedsReview => println!(
            "⚠️  Needs review: {}",
            outcome.parse_error.as_deref().unwrap_or("check transactions")
        ),
        ParseStatus::Failed => {
            println!(
                "❌ Failed: {}",
                outcome.parse_error.as_deref().unwrap_or("unknown error")
            );
            return;
        }
    }

    if let Some(ref info) = outcome.account_info {
        print!("   Bank: {}", info.bank_name);
        if let Some(ref account) = info.account_number {
            print!("   Account: {}", account);
        }
        if let (Some(start), Some(end)) = (info.period_start, info.period_end) {
            print!("   Period: {} - {}", start, end);
        }
        println!();
    }
    println!();

    println!(
        "   {:<12} {:<6} {:>10}  {:<34} {:<22} {}",
        "Date", "Type", "Amount", "Description", "Category", "Review"
    );
    println!("   {}", "─".repeat(96));
    for tx in &outcome.transactions {
        println!(
            "   {:<12} {:<6} {:>10.2}  {:<34} {:<22} {}",
            tx.transaction.date,
            tx.transaction.transaction_type,
            tx.transaction.amount,
            truncate(&tx.transaction.description, 34),
            tx.suggested_category_name.as_deref().unwrap_or("-"),
            if tx.needs_review { "⚠" } else { "" }
        );
    }
    println!();

    if let Some(summary) = outcome.summary {
        println!(
            "   {} transactions   in: £{:.2}   out: £{:.2}   flagged for review: {}",
            outcome.transactions.len(),
            summary.total_credits,
            summary.total_debits,
            outcome.transactions.iter().filter(|t| t.needs_review).count()
        );
    }
}
