//! Statement processing pipeline.
//!
//! One `StatementProcessor` call takes an uploaded file end to end:
//! format detection, text extraction, parsing, regime resolution, and
//! categorization, assembled into a single `StatementOutcome`. Every
//! failure mode comes back in that same shape with `parse_status` set;
//! callers never need a second error contract.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::ai::AIClient;
use crate::db::Database;
use crate::detect::FileFormat;
use crate::engine::{CategorizationEngine, CategorizationOptions};
use crate::error::{Error, Result};
use crate::extract::{DoclingClient, PdfExtractor, MIN_EXTRACTED_CHARS};
use crate::models::{
    CategorizationMode, CategorizedTransaction, ParseStatus, StatementOutcome, TaxRegime,
};
use crate::parsers::{self, ParsedStatement};

/// Per-request processing parameters.
#[derive(Debug, Clone, Default)]
pub struct ProcessRequest {
    pub filename: String,
    pub content_type: Option<String>,
    pub entity_id: Option<i64>,
    pub user_id: Option<String>,
    pub mode: CategorizationMode,
}

pub struct StatementProcessor {
    db: Database,
    ai: Option<AIClient>,
    docling: Option<DoclingClient>,
    pdf_fallback: Arc<dyn PdfExtractor>,
}

impl StatementProcessor {
    pub fn new(
        db: Database,
        ai: Option<AIClient>,
        docling: Option<DoclingClient>,
        pdf_fallback: Arc<dyn PdfExtractor>,
    ) -> Self {
        Self {
            db,
            ai,
            docling,
            pdf_fallback,
        }
    }

    /// Process one uploaded statement file.
    pub async fn process(&self, bytes: &[u8], request: &ProcessRequest) -> StatementOutcome {
        let format = FileFormat::detect(
            &request.filename,
            request.content_type.as_deref().unwrap_or_default(),
        );
        info!(filename = %request.filename, ?format, "processing statement");

        // Resolve the regime up front; it steers both parsing prompts and
        // the taxonomy used for categorization
        let regime = match self.resolve_regime(request.entity_id) {
            Ok(regime) => regime,
            Err(err) => {
                return StatementOutcome::failed(String::new(), err.to_string());
            }
        };

        let (parsed, extracted_text) = match self.parse_file(bytes, format).await {
            Ok(ok) => ok,
            Err(ParseFailure::Extraction(message)) => {
                return StatementOutcome::failed(String::new(), message);
            }
            Err(ParseFailure::NoTransactions {
                extracted_text,
                message,
            }) => {
                return StatementOutcome {
                    transactions: Vec::new(),
                    account_info: None,
                    summary: None,
                    extracted_text,
                    parse_status: ParseStatus::NeedsReview,
                    parse_error: Some(message),
                    entity_id: request.entity_id,
                };
            }
        };

        let engine = CategorizationEngine::new(self.db.clone(), self.ai.clone());
        let options = CategorizationOptions {
            user_id: request.user_id.clone(),
            entity_id: request.entity_id,
            regime,
            mode: request.mode,
        };
        let results = match engine.categorize_batch(&parsed.transactions, &options).await {
            Ok(results) => results,
            Err(err) => {
                // Categorization must not sink a successful parse; return
                // everything uncategorized and flagged
                warn!(error = %err, "categorization failed, returning transactions for review");
                parsed
                    .transactions
                    .iter()
                    .map(|_| crate::models::CategorizationResult::no_match())
                    .collect()
            }
        };

        let transactions: Vec<CategorizedTransaction> = parsed
            .transactions
            .into_iter()
            .zip(results)
            .map(|(transaction, result)| CategorizedTransaction {
                transaction,
                suggested_category_id: result.category_id,
                suggested_category_name: result.category_name,
                confidence_score: result.confidence,
                categorization_source: result.source,
                needs_review: result.needs_review,
                auto_approved: result.auto_approve,
                reasoning: Some(result.reasoning),
            })
            .collect();

        info!(
            count = transactions.len(),
            needs_review = transactions.iter().filter(|t| t.needs_review).count(),
            %regime,
            "statement processed"
        );

        StatementOutcome {
            transactions,
            account_info: Some(parsed.account_info),
            summary: Some(parsed.summary),
            extracted_text,
            parse_status: ParseStatus::Success,
            parse_error: None,
            entity_id: request.entity_id,
        }
    }

    /// Company-like entities file under Companies House; everything else,
    /// including no entity at all, defaults to HMRC.
    fn resolve_regime(&self, entity_id: Option<i64>) -> Result<TaxRegime> {
        let Some(id) = entity_id else {
            return Ok(TaxRegime::Hmrc);
        };
        match self.db.get_entity(id) {
            Ok(entity) => Ok(TaxRegime::for_entity_type(entity.entity_type)),
            Err(Error::NotFound(_)) => {
                debug!(entity_id = id, "entity not found, defaulting to hmrc regime");
                Ok(TaxRegime::Hmrc)
            }
            Err(err) => Err(err),
        }
    }

    async fn parse_file(
        &self,
        bytes: &[u8],
        format: FileFormat,
    ) -> std::result::Result<(ParsedStatement, String), ParseFailure> {
        match format {
            FileFormat::Csv => {
                let text = String::from_utf8_lossy(bytes).to_string();
                if text.trim().len() < MIN_EXTRACTED_CHARS {
                    return Err(ParseFailure::Extraction(
                        "could not extract enough text".into(),
                    ));
                }
                match parsers::csv::parse(bytes) {
                    Ok(parsed) => Ok((parsed, text)),
                    Err(err) => Err(ParseFailure::NoTransactions {
                        extracted_text: text,
                        message: err.to_string(),
                    }),
                }
            }
            FileFormat::Pdf => {
                let text = self.extract_pdf_text(bytes).await?;
                self.parse_text(text).await
            }
            FileFormat::Text => {
                let text = String::from_utf8_lossy(bytes).to_string();
                if text.trim().len() < MIN_EXTRACTED_CHARS {
                    return Err(ParseFailure::Extraction(
                        "could not extract enough text".into(),
                    ));
                }
                self.parse_text(text).await
            }
        }
    }

    /// Docling first when configured and alive, `pdftotext` otherwise.
    async fn extract_pdf_text(&self, bytes: &[u8]) -> std::result::Result<String, ParseFailure> {
        if let Some(ref docling) = self.docling {
            if docling.health_check().await {
                match docling.extract(bytes).await {
                    Ok(text) => return Ok(text),
                    Err(err) => {
                        warn!(error = %err, "docling extraction failed, falling back to subprocess");
                    }
                }
            } else {
                debug!("docling configured but unhealthy, using subprocess extractor");
            }
        }
        self.pdf_fallback
            .extract(bytes)
            .await
            .map_err(|err| ParseFailure::Extraction(err.to_string()))
    }

    async fn parse_text(
        &self,
        text: String,
    ) -> std::result::Result<(ParsedStatement, String), ParseFailure> {
        if parsers::monzo::detect(&text) {
            debug!("monzo statement detected");
            match parsers::monzo::parse(&text) {
                Ok(parsed) => return Ok((parsed, text)),
                Err(err) => {
                    warn!(error = %err, "monzo parse failed, trying AI parser");
                }
            }
        }

        let Some(ref ai) = self.ai else {
            return Err(ParseFailure::NoTransactions {
                message: "statement layout not recognized and no AI backend configured".into(),
                extracted_text: text,
            });
        };
        match parsers::llm::parse(ai, &text).await {
            Ok(parsed) => Ok((parsed, text)),
            Err(err) => Err(ParseFailure::NoTransactions {
                message: err.to_string(),
                extracted_text: text,
            }),
        }
    }
}

enum ParseFailure {
    /// Nothing usable came out of the file; `parse_status = failed`
    Extraction(String),
    /// Text was readable but yielded no rows; `parse_status = needs_review`
    NoTransactions {
        extracted_text: String,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AIClient, MockBackend};
    use crate::extract::StubExtractor;
    use crate::models::{CategorizationSource, EntityType, NewEntity, TransactionType};

    const MONZO_TEXT: &str = "\
Monzo Bank Limited
Sort code: 04-00-03   Account number: 12345678
Statement period 01/10/2024 - 31/10/2024
03/10/2024   TESCO STORES 3302 LONDON            -23.50          1,476.50
05/10/2024   ACME LTD SALARY OCTOBER             2,000.00        3,476.50
";

    fn processor(db: &Database, mock: MockBackend, extracted: &str) -> StatementProcessor {
        StatementProcessor::new(
            db.clone(),
            Some(AIClient::Mock(mock)),
            None,
            Arc::new(StubExtractor(extracted.to_string())),
        )
    }

    fn request(filename: &str) -> ProcessRequest {
        ProcessRequest {
            filename: filename.to_string(),
            content_type: None,
            entity_id: None,
            user_id: Some("alice".into()),
            mode: CategorizationMode::Smart,
        }
    }

    #[tokio::test]
    async fn test_pdf_monzo_end_to_end() {
        let db = Database::in_memory().unwrap();
        let processor = processor(&db, MockBackend::new(), MONZO_TEXT);

        let outcome = processor
            .process(b"%PDF-1.4 irrelevant", &request("statement.pdf"))
            .await;

        assert_eq!(outcome.parse_status, ParseStatus::Success);
        assert_eq!(outcome.transactions.len(), 2);

        let tesco = &outcome.transactions[0];
        assert_eq!(tesco.suggested_category_name.as_deref(), Some("Groceries"));
        assert_eq!(tesco.categorization_source, CategorizationSource::Rule);
        assert!(tesco.auto_approved);

        let salary = &outcome.transactions[1];
        assert_eq!(salary.transaction.transaction_type, TransactionType::Credit);
        assert_eq!(salary.suggested_category_name.as_deref(), Some("Salary"));

        let summary = outcome.summary.unwrap();
        assert_eq!(summary.total_credits, 2000.00);
        assert_eq!(summary.total_debits, 23.50);
    }

    #[tokio::test]
    async fn test_extraction_failure_is_failed_status() {
        let db = Database::in_memory().unwrap();
        // Stub yields under the minimum, mirroring a scanned PDF
        let processor = processor(&db, MockBackend::new(), "tiny");

        let outcome = processor.process(b"%PDF-1.4", &request("scan.pdf")).await;
        assert_eq!(outcome.parse_status, ParseStatus::Failed);
        assert!(outcome.transactions.is_empty());
        assert!(outcome.parse_error.unwrap().contains("enough text"));
    }

    #[tokio::test]
    async fn test_unparseable_csv_is_needs_review() {
        let db = Database::in_memory().unwrap();
        let processor = processor(&db, MockBackend::new(), "");

        let csv = b"Date,Description,Amount\nnothing in this export resembles a transaction row\n";
        let outcome = processor.process(csv, &request("export.csv")).await;
        assert_eq!(outcome.parse_status, ParseStatus::NeedsReview);
        assert!(outcome.transactions.is_empty());
        assert!(outcome.parse_error.is_some());
    }

    #[tokio::test]
    async fn test_short_csv_fails_extraction_threshold() {
        let db = Database::in_memory().unwrap();
        let processor = processor(&db, MockBackend::new(), "");

        // Parseable row, but the file is under the minimum text length
        let csv = b"Date,Description,Amount\n01/10/24,TESCO,-1.0\n";
        assert!(csv.len() < MIN_EXTRACTED_CHARS);
        let outcome = processor.process(csv, &request("tiny.csv")).await;
        assert_eq!(outcome.parse_status, ParseStatus::Failed);
        assert!(outcome.transactions.is_empty());
        assert!(outcome.parse_error.unwrap().contains("enough text"));
    }

    #[tokio::test]
    async fn test_csv_end_to_end() {
        let db = Database::in_memory().unwrap();
        let processor = processor(&db, MockBackend::new(), "");

        let csv = b"Date,Description,Amount\n01/10/2024,TESCO STORES,-12.00\n";
        let outcome = processor.process(csv, &request("export.csv")).await;
        assert_eq!(outcome.parse_status, ParseStatus::Success);
        assert_eq!(
            outcome.transactions[0].suggested_category_name.as_deref(),
            Some("Groceries")
        );
    }

    #[tokio::test]
    async fn test_company_entity_selects_companies_house() {
        let db = Database::in_memory().unwrap();
        let company = db
            .create_entity(&NewEntity {
                name: "Acme Ltd".into(),
                entity_type: EntityType::LimitedCompany,
                ni_number: None,
                utr: None,
                vat_number: None,
                user_id: Some("alice".into()),
            })
            .unwrap();

        let text = format!(
            "Monzo Business\nSort code: 04-00-03\n{}",
            "03/10/2024   DIRECTOR SALARY MARCH               -3,000.00       5,000.00\n"
        );
        let processor = processor(&db, MockBackend::new(), &text);
        let mut req = request("statement.pdf");
        req.entity_id = Some(company.id);

        let outcome = processor.process(b"%PDF-1.4", &req).await;
        assert_eq!(outcome.entity_id, Some(company.id));
        assert_eq!(
            outcome.transactions[0].suggested_category_name.as_deref(),
            Some("Directors Remuneration")
        );
    }

    #[tokio::test]
    async fn test_unknown_layout_uses_ai_parser() {
        let db = Database::in_memory().unwrap();
        let text = format!("SOMEBANK PLC STATEMENT {}", "x".repeat(60));
        let mock = MockBackend::new().with_response(
            r#"{"bank_name": "Somebank", "transactions": [
                {"date": "2024-10-03", "description": "COFFEE", "amount": 3.20, "type": "debit"}
            ]}"#,
        );
        let processor = processor(&db, mock, &text);

        let outcome = processor.process(b"%PDF-1.4", &request("other.pdf")).await;
        assert_eq!(outcome.parse_status, ParseStatus::Success);
        assert_eq!(outcome.transactions.len(), 1);
        assert_eq!(
            outcome.account_info.unwrap().bank_name,
            "Somebank"
        );
    }
}
