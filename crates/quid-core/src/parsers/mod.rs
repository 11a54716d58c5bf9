//! Bank statement parsers.
//!
//! Three routes from raw statement content to transactions:
//!
//! - `monzo`: line-oriented parser for Monzo PDF statement text
//! - `csv`: generic CSV export parser with header sniffing
//! - `llm`: AI fallback for statement layouts nothing else recognizes
//!
//! The pipeline picks the route; parsers only turn text into
//! `ParsedTransaction`s.

pub mod csv;
pub mod llm;
pub mod monzo;

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

use crate::models::{AccountInfo, ParsedTransaction, StatementSummary, TransactionType};

/// What a parser produces for one statement.
#[derive(Debug, Clone, Default)]
pub struct ParsedStatement {
    pub transactions: Vec<ParsedTransaction>,
    pub account_info: AccountInfo,
    pub summary: StatementSummary,
}

impl ParsedStatement {
    /// Recompute credit/debit totals from the transaction list.
    pub fn with_totals(mut self) -> Self {
        let mut credits = 0.0;
        let mut debits = 0.0;
        for tx in &self.transactions {
            match tx.transaction_type {
                TransactionType::Credit => credits += tx.amount.abs(),
                TransactionType::Debit => debits += tx.amount.abs(),
            }
        }
        self.summary = StatementSummary {
            total_credits: (credits * 100.0).round() / 100.0,
            total_debits: (debits * 100.0).round() / 100.0,
        };
        self
    }
}

/// Parse a UK-style date. Tries `DD/MM/YYYY`, ISO, and `D Month YYYY`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .or_else(|_| NaiveDate::parse_from_str(s, "%d-%m-%Y"))
        .or_else(|_| NaiveDate::parse_from_str(s, "%d %B %Y"))
        .or_else(|_| NaiveDate::parse_from_str(s, "%d %b %Y"))
        .ok()
}

/// Parse a money amount, tolerating currency symbols, commas, and
/// parenthesized negatives.
pub fn parse_amount(s: &str) -> Option<f64> {
    let s = s.trim();
    let (s, negate) = match s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        Some(inner) => (inner, true),
        None => (s, false),
    };
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    let value: f64 = cleaned.parse().ok()?;
    Some(if negate { -value } else { value })
}

/// Stable dedup hash over the fields that identify a transaction.
pub fn import_hash(
    date: NaiveDate,
    description: &str,
    amount: f64,
    transaction_type: TransactionType,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(date.format("%Y-%m-%d").to_string());
    hasher.update("|");
    hasher.update(description.trim());
    hasher.update("|");
    hasher.update(format!("{:.2}", amount));
    hasher.update("|");
    hasher.update(transaction_type.as_str());
    hex::encode(hasher.finalize())
}
