//! Monzo bank statement parser.
//!
//! Works on the text layer of Monzo PDF statements. Transaction rows carry
//! `DD/MM/YYYY description ... amount balance`, but descriptions regularly
//! wrap across lines, so rows are accumulated until the amount/balance tail
//! shows up.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{AccountInfo, ParsedTransaction, TransactionType};

use super::{import_hash, parse_amount, parse_date, ParsedStatement};

/// Does this text look like a Monzo statement?
pub fn detect(text: &str) -> bool {
    const INDICATORS: &[&str] = &[
        "Monzo",
        "MONZ",
        "monzo.com",
        "Sort code: 04-00-03",
        "BIC: MONZGB2L",
    ];
    INDICATORS.iter().any(|ind| text.contains(ind))
}

fn date_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{2}/\d{2}/\d{4})\s+(.*)$").unwrap())
}

/// Amount then balance at the end of a row. Amount may be negative; the
/// running balance never is.
fn amount_balance_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(-?[\d,]+\.\d{2})\s+([\d,]+\.\d{2})\s*$").unwrap())
}

fn page_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"--\s*\d+\s*of\s*\d+\s*--").unwrap())
}

fn period_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{2}/\d{2}/\d{4})\s*-\s*(\d{2}/\d{2}/\d{4})").unwrap())
}

fn sort_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Sort code:\s*(\d{2}-\d{2}-\d{2})").unwrap())
}

fn account_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Account number:\s*(\d+)").unwrap())
}

pub fn parse(text: &str) -> Result<ParsedStatement> {
    let mut account_info = AccountInfo {
        bank_name: "Monzo".to_string(),
        ..Default::default()
    };

    if let Some(caps) = period_re().captures(text) {
        account_info.period_start = parse_date(&caps[1]);
        account_info.period_end = parse_date(&caps[2]);
    }
    if let Some(caps) = sort_code_re().captures(text) {
        account_info.sort_code = Some(caps[1].to_string());
    }
    if let Some(caps) = account_number_re().captures(text) {
        account_info.account_number = Some(caps[1].to_string());
    }

    let cleaned = page_marker_re().replace_all(text, "");
    let lines: Vec<&str> = cleaned
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut transactions = Vec::new();
    let mut current_date: Option<&str> = None;
    let mut desc_parts: Vec<String> = Vec::new();

    let mut flush = |date_str: &str, desc_parts: &mut Vec<String>, amount_str: &str, balance_str: &str| {
        let description = desc_parts.join(" ").trim().to_string();
        desc_parts.clear();
        if description.is_empty() {
            return;
        }
        // Header rows survive the date check when column titles wrap
        if description.contains("Date") && description.contains("Description") {
            return;
        }
        if description.contains("(GBP) Amount") {
            return;
        }
        let Some(date) = parse_date(date_str) else {
            return;
        };
        let Some(raw_amount) = parse_amount(amount_str) else {
            return;
        };
        let transaction_type = if raw_amount < 0.0 {
            TransactionType::Debit
        } else {
            TransactionType::Credit
        };
        let amount = raw_amount.abs();
        transactions.push(ParsedTransaction {
            date,
            import_hash: import_hash(date, &description, amount, transaction_type),
            description,
            amount,
            transaction_type,
            balance: parse_amount(balance_str),
            reference: None,
        });
    };

    // Flush whatever is buffered once its amount/balance tail is known.
    let try_flush_buffered =
        |current_date: &mut Option<&str>, desc_parts: &mut Vec<String>, flush: &mut dyn FnMut(&str, &mut Vec<String>, &str, &str)| {
            let (Some(date), false) = (*current_date, desc_parts.is_empty()) else {
                return;
            };
            let combined = desc_parts.join(" ");
            if let Some(caps) = amount_balance_re().captures(&combined) {
                let clean = amount_balance_re().replace(&combined, "").trim().to_string();
                *desc_parts = vec![clean];
                let amount = caps[1].to_string();
                let balance = caps[2].to_string();
                flush(date, desc_parts, &amount, &balance);
            }
            *current_date = None;
            desc_parts.clear();
        };

    for line in lines {
        if let Some(caps) = date_line_re().captures(line) {
            let date_str = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let rest = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

            if let Some(amt_caps) = amount_balance_re().captures(rest) {
                // Single-line row; close out anything still buffered first
                try_flush_buffered(&mut current_date, &mut desc_parts, &mut flush);
                let desc = amount_balance_re().replace(rest, "").trim().to_string();
                let mut parts = vec![desc];
                flush(date_str, &mut parts, &amt_caps[1], &amt_caps[2]);
            } else {
                try_flush_buffered(&mut current_date, &mut desc_parts, &mut flush);
                // Date line without amounts; description continues below
                current_date = Some(date_str);
                desc_parts = vec![rest.to_string()];
            }
        } else if let Some(date_str) = current_date {
            if let Some(amt_caps) = amount_balance_re().captures(line) {
                let desc = amount_balance_re().replace(line, "").trim().to_string();
                if !desc.is_empty() {
                    desc_parts.push(desc);
                }
                flush(date_str, &mut desc_parts, &amt_caps[1], &amt_caps[2]);
                current_date = None;
            } else {
                desc_parts.push(line.to_string());
            }
        }
    }
    try_flush_buffered(&mut current_date, &mut desc_parts, &mut flush);

    debug!(count = transactions.len(), "monzo parse complete");

    if transactions.is_empty() {
        return Err(Error::Parse(
            "No transactions found in statement text".into(),
        ));
    }

    Ok(ParsedStatement {
        transactions,
        account_info,
        ..Default::default()
    }
    .with_totals())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &str = "\
Monzo Bank Limited
Sort code: 04-00-03   Account number: 12345678
Statement period 01/10/2024 - 31/10/2024

Date         Description                         (GBP) Amount    (GBP) Balance
03/10/2024   TESCO STORES 3302 LONDON            -23.50          1,476.50
05/10/2024   ACME LTD SALARY
             OCTOBER                             2,000.00        3,476.50
-- 1 of 2 --
07/10/2024   NETFLIX.COM
             SUBSCRIPTION                        -9.99           3,466.51
";

    #[test]
    fn test_detect() {
        assert!(detect(SAMPLE));
        assert!(detect("statement from monzo.com"));
        assert!(!detect("Barclays Bank PLC statement"));
    }

    #[test]
    fn test_parse_sample() {
        let parsed = parse(SAMPLE).unwrap();
        assert_eq!(parsed.transactions.len(), 3);

        let tesco = &parsed.transactions[0];
        assert_eq!(tesco.date, NaiveDate::from_ymd_opt(2024, 10, 3).unwrap());
        assert_eq!(tesco.description, "TESCO STORES 3302 LONDON");
        assert_eq!(tesco.amount, 23.50);
        assert_eq!(tesco.transaction_type, TransactionType::Debit);
        assert_eq!(tesco.balance, Some(1476.50));

        // Wrapped description accumulates, page marker is stripped
        let salary = &parsed.transactions[1];
        assert_eq!(salary.description, "ACME LTD SALARY OCTOBER");
        assert_eq!(salary.transaction_type, TransactionType::Credit);
        assert_eq!(salary.amount, 2000.00);

        let netflix = &parsed.transactions[2];
        assert_eq!(netflix.description, "NETFLIX.COM SUBSCRIPTION");
        assert_eq!(netflix.transaction_type, TransactionType::Debit);
    }

    #[test]
    fn test_account_info_extracted() {
        let parsed = parse(SAMPLE).unwrap();
        let info = &parsed.account_info;
        assert_eq!(info.bank_name, "Monzo");
        assert_eq!(info.sort_code.as_deref(), Some("04-00-03"));
        assert_eq!(info.account_number.as_deref(), Some("12345678"));
        assert_eq!(
            info.period_start,
            NaiveDate::from_ymd_opt(2024, 10, 1)
        );
        assert_eq!(info.period_end, NaiveDate::from_ymd_opt(2024, 10, 31));
    }

    #[test]
    fn test_totals() {
        let parsed = parse(SAMPLE).unwrap();
        assert_eq!(parsed.summary.total_credits, 2000.00);
        assert_eq!(parsed.summary.total_debits, 33.49);
    }

    #[test]
    fn test_no_transactions_is_an_error() {
        let err = parse("Monzo Bank Limited\nno rows here\n").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_header_rows_skipped() {
        let parsed = parse(SAMPLE).unwrap();
        assert!(parsed
            .transactions
            .iter()
            .all(|t| !t.description.contains("Description")));
    }
}
