//! AI fallback statement parser.
//!
//! Used when no deterministic parser recognizes the statement text. The
//! model gets a bounded prefix of the extracted text and must answer with
//! strict JSON; anything it returns is re-validated before use.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::ai::parsing::extract_json_object;
use crate::ai::{AIBackend, CompletionRequest};
use crate::error::{Error, Result};
use crate::models::{AccountInfo, ParsedTransaction, TransactionType};

use super::{import_hash, parse_date, ParsedStatement};

/// Hard cap on how much statement text goes to the model.
const MAX_PROMPT_CHARS: usize = 30_000;
const MAX_RESPONSE_TOKENS: u32 = 16_000;

const SYSTEM_PROMPT: &str = "You are a bank statement parser. You extract transactions \
from raw statement text and reply with strict JSON only: no markdown, no commentary.";

fn build_prompt(text: &str) -> String {
    // Truncate on a char boundary; statements longer than this carry their
    // transaction table well within the prefix
    let prefix: String = text.chars().take(MAX_PROMPT_CHARS).collect();
    format!(
        r#"Extract every transaction from this bank statement text.

Reply with ONLY a JSON object in exactly this shape:
{{
  "bank_name": "string",
  "sort_code": "string or null",
  "account_number": "string or null",
  "period_start": "YYYY-MM-DD or null",
  "period_end": "YYYY-MM-DD or null",
  "transactions": [
    {{"date": "YYYY-MM-DD", "description": "string", "amount": 12.34, "type": "credit" or "debit", "balance": 12.34 or null}}
  ]
}}

Rules:
- "amount" is always positive; direction goes in "type"
- include every transaction row, skip headers, totals and marketing text
- dates must be ISO format

STATEMENT TEXT:
{prefix}"#
    )
}

#[derive(Debug, Deserialize)]
struct LlmStatement {
    #[serde(default)]
    bank_name: Option<String>,
    #[serde(default)]
    sort_code: Option<String>,
    #[serde(default)]
    account_number: Option<String>,
    #[serde(default)]
    period_start: Option<String>,
    #[serde(default)]
    period_end: Option<String>,
    #[serde(default)]
    transactions: Vec<LlmTransaction>,
}

#[derive(Debug, Deserialize)]
struct LlmTransaction {
    date: String,
    description: String,
    amount: f64,
    #[serde(rename = "type")]
    transaction_type: String,
    #[serde(default)]
    balance: Option<f64>,
}

pub async fn parse(ai: &dyn AIBackend, text: &str) -> Result<ParsedStatement> {
    let request = CompletionRequest::new(build_prompt(text))
        .with_system(SYSTEM_PROMPT)
        .with_max_tokens(MAX_RESPONSE_TOKENS);

    let response = ai.complete(&request).await?;
    debug!(response_len = response.len(), "llm parser response");

    let value = extract_json_object(&response)?;
    let statement: LlmStatement = serde_json::from_value(value)?;

    let mut transactions = Vec::new();
    for tx in statement.transactions {
        let Some(date) = parse_date(&tx.date) else {
            warn!(date = %tx.date, "llm parser returned unparseable date, skipping row");
            continue;
        };
        let Ok(transaction_type) = tx.transaction_type.parse::<TransactionType>() else {
            warn!(tx_type = %tx.transaction_type, "llm parser returned unknown type, skipping row");
            continue;
        };
        let description = tx.description.trim().to_string();
        if description.is_empty() || !tx.amount.is_finite() {
            continue;
        }
        let amount = tx.amount.abs();
        transactions.push(ParsedTransaction {
            date,
            import_hash: import_hash(date, &description, amount, transaction_type),
            description,
            amount,
            transaction_type,
            balance: tx.balance,
            reference: None,
        });
    }

    if transactions.is_empty() {
        return Err(Error::Parse(
            "AI parser returned no usable transactions".into(),
        ));
    }

    Ok(ParsedStatement {
        transactions,
        account_info: AccountInfo {
            bank_name: statement.bank_name.unwrap_or_else(|| "Unknown".to_string()),
            sort_code: statement.sort_code,
            account_number: statement.account_number,
            period_start: statement.period_start.as_deref().and_then(parse_date),
            period_end: statement.period_end.as_deref().and_then(parse_date),
        },
        ..Default::default()
    }
    .with_totals())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;

    #[tokio::test]
    async fn test_parse_valid_response() {
        let response = r#"```json
{
  "bank_name": "Starling",
  "sort_code": "60-83-71",
  "account_number": "87654321",
  "period_start": "2024-05-01",
  "period_end": "2024-05-31",
  "transactions": [
    {"date": "2024-05-02", "description": "PRET A MANGER", "amount": 6.50, "type": "debit", "balance": 993.50},
    {"date": "2024-05-03", "description": "BACS CREDIT ACME", "amount": 1200.00, "type": "credit", "balance": 2193.50}
  ]
}
```"#;
        let ai = MockBackend::new().with_response(response);
        let parsed = parse(&ai, "some statement text").await.unwrap();
        assert_eq!(parsed.transactions.len(), 2);
        assert_eq!(parsed.account_info.bank_name, "Starling");
        assert_eq!(parsed.summary.total_credits, 1200.00);
        assert_eq!(parsed.summary.total_debits, 6.50);
    }

    #[tokio::test]
    async fn test_bad_rows_dropped_good_rows_kept() {
        let response = r#"{
  "bank_name": "Unknown",
  "transactions": [
    {"date": "not-a-date", "description": "BAD", "amount": 1.0, "type": "debit"},
    {"date": "2024-05-02", "description": "GOOD", "amount": 2.0, "type": "sideways"},
    {"date": "2024-05-02", "description": "KEPT", "amount": 3.0, "type": "debit"}
  ]
}"#;
        let ai = MockBackend::new().with_response(response);
        let parsed = parse(&ai, "text").await.unwrap();
        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.transactions[0].description, "KEPT");
    }

    #[tokio::test]
    async fn test_empty_response_is_an_error() {
        let ai = MockBackend::new().with_response(r#"{"transactions": []}"#);
        assert!(parse(&ai, "text").await.is_err());
    }

    #[tokio::test]
    async fn test_prompt_is_bounded() {
        let ai = MockBackend::new().with_response(r#"{"transactions": []}"#);
        let long_text = "x".repeat(100_000);
        let _ = parse(&ai, &long_text).await;
        let requests = ai.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].prompt.len() < 32_000);
        assert_eq!(requests[0].max_tokens, 16_000);
    }
}
