//! Generic CSV statement parser.
//!
//! UK bank CSV exports share a small vocabulary of column names but no fixed
//! order, so the header row is sniffed for the columns we need. Two amount
//! shapes are handled: a single signed `Amount` column, or a `Money In` /
//! `Money Out` pair.

use std::io::Read;

use csv::ReaderBuilder;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{AccountInfo, ParsedTransaction, TransactionType};

use super::{import_hash, parse_amount, parse_date, ParsedStatement};

#[derive(Debug)]
struct ColumnMap {
    date: usize,
    description: usize,
    amount: Option<usize>,
    money_in: Option<usize>,
    money_out: Option<usize>,
    balance: Option<usize>,
    reference: Option<usize>,
}

fn sniff_columns(headers: &csv::StringRecord) -> Result<ColumnMap> {
    let find = |names: &[&str]| {
        headers.iter().position(|h| {
            let h = h.trim().to_lowercase();
            names.iter().any(|n| h == *n || h.starts_with(n))
        })
    };

    let date = find(&["date", "transaction date", "posting date"])
        .ok_or_else(|| Error::Parse("CSV has no date column".into()))?;
    let description = find(&["description", "narrative", "details", "merchant", "name"])
        .ok_or_else(|| Error::Parse("CSV has no description column".into()))?;

    let money_in = find(&["money in", "paid in", "credit amount", "deposits"]);
    let money_out = find(&["money out", "paid out", "debit amount", "withdrawals"]);
    let amount = find(&["amount", "value"]);
    if amount.is_none() && (money_in.is_none() || money_out.is_none()) {
        return Err(Error::Parse("CSV has no amount column".into()));
    }

    Ok(ColumnMap {
        date,
        description,
        amount,
        money_in,
        money_out,
        balance: find(&["balance", "running bal"]),
        reference: find(&["reference", "transaction id"]),
    })
}

pub fn parse<R: Read>(reader: R) -> Result<ParsedStatement> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let columns = sniff_columns(&headers)?;
    debug!(?columns, "sniffed CSV columns");

    let mut transactions = Vec::new();
    for result in rdr.records() {
        let record = result?;

        let Some(date) = record.get(columns.date).and_then(parse_date) else {
            // Skip summary/footer rows without a parseable date
            continue;
        };
        let description = record
            .get(columns.description)
            .unwrap_or_default()
            .trim()
            .to_string();
        if description.is_empty() {
            continue;
        }

        // Signed single column, or the in/out pair
        let signed = match columns.amount {
            Some(idx) => record.get(idx).and_then(parse_amount),
            None => {
                let money_in = columns
                    .money_in
                    .and_then(|i| record.get(i))
                    .and_then(parse_amount)
                    .filter(|v| *v != 0.0);
                let money_out = columns
                    .money_out
                    .and_then(|i| record.get(i))
                    .and_then(parse_amount)
                    .filter(|v| *v != 0.0);
                match (money_in, money_out) {
                    (Some(amount), _) => Some(amount.abs()),
                    (None, Some(amount)) => Some(-amount.abs()),
                    (None, None) => None,
                }
            }
        };
        let Some(signed) = signed else {
            continue;
        };

        let transaction_type = if signed < 0.0 {
            TransactionType::Debit
        } else {
            TransactionType::Credit
        };
        let amount = signed.abs();
        let balance = columns
            .balance
            .and_then(|i| record.get(i))
            .and_then(parse_amount);
        let reference = columns
            .reference
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(String::from);

        transactions.push(ParsedTransaction {
            date,
            import_hash: import_hash(date, &description, amount, transaction_type),
            description,
            amount,
            transaction_type,
            balance,
            reference,
        });
    }

    if transactions.is_empty() {
        return Err(Error::Parse("No transactions found in CSV".into()));
    }

    let mut parsed = ParsedStatement {
        transactions,
        account_info: AccountInfo {
            bank_name: "CSV import".to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
    .with_totals();

    // Statement period falls out of the transaction dates
    let dates: Vec<_> = parsed.transactions.iter().map(|t| t.date).collect();
    parsed.account_info.period_start = dates.iter().min().copied();
    parsed.account_info.period_end = dates.iter().max().copied();

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_signed_amount_column() {
        let data = "\
Date,Description,Amount,Balance
01/02/2024,TESCO STORES,-12.30,987.70
03/02/2024,CLIENT INVOICE 42,1500.00,2487.70
";
        let parsed = parse(data.as_bytes()).unwrap();
        assert_eq!(parsed.transactions.len(), 2);
        assert_eq!(
            parsed.transactions[0].transaction_type,
            TransactionType::Debit
        );
        assert_eq!(parsed.transactions[0].amount, 12.30);
        assert_eq!(parsed.transactions[1].transaction_type, TransactionType::Credit);
        assert_eq!(parsed.summary.total_credits, 1500.00);
        assert_eq!(parsed.summary.total_debits, 12.30);
    }

    #[test]
    fn test_money_in_out_columns() {
        let data = "\
Date,Details,Money Out,Money In,Balance
2024-02-01,COFFEE SHOP,3.20,,996.80
2024-02-02,REFUND ACME,,45.00,1041.80
";
        let parsed = parse(data.as_bytes()).unwrap();
        assert_eq!(parsed.transactions.len(), 2);
        assert_eq!(parsed.transactions[0].transaction_type, TransactionType::Debit);
        assert_eq!(parsed.transactions[0].amount, 3.20);
        assert_eq!(parsed.transactions[1].transaction_type, TransactionType::Credit);
        assert_eq!(parsed.transactions[1].amount, 45.00);
    }

    #[test]
    fn test_period_from_dates() {
        let data = "\
Date,Description,Amount
05/02/2024,B,1.00
01/02/2024,A,-1.00
";
        let parsed = parse(data.as_bytes()).unwrap();
        assert_eq!(
            parsed.account_info.period_start,
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
        assert_eq!(
            parsed.account_info.period_end,
            NaiveDate::from_ymd_opt(2024, 2, 5)
        );
    }

    #[test]
    fn test_footer_rows_skipped() {
        let data = "\
Date,Description,Amount
01/02/2024,SHOP,-5.00
Total,,−5.00
";
        let parsed = parse(data.as_bytes()).unwrap();
        assert_eq!(parsed.transactions.len(), 1);
    }

    #[test]
    fn test_missing_columns_rejected() {
        let err = parse("Foo,Bar\n1,2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }
}
