//! Quid Core Library
//!
//! Shared functionality for the Quid bank statement processor:
//! - Database access, migrations, and the seeded category taxonomies
//! - Statement text extraction (docling sidecar + pdftotext fallback)
//! - Bank statement parsers (Monzo, generic CSV, AI fallback)
//! - Pluggable AI backends (Gemini, OpenAI-compatible servers)
//! - 4-layer categorization engine with per-regime taxonomies
//! - Feedback recording with rule auto-learning
//! - The end-to-end statement processing pipeline

pub mod ai;
pub mod db;
pub mod detect;
pub mod engine;
pub mod error;
pub mod extract;
pub mod models;
pub mod parsers;
pub mod pipeline;

pub use ai::{
    AIBackend, AIClient, CompletionRequest, GeminiBackend, MockBackend, OpenAICompatibleBackend,
};
pub use db::Database;
pub use detect::FileFormat;
pub use engine::{CategorizationEngine, CategorizationOptions, AI_BATCH_CAP};
pub use error::{Error, Result};
pub use extract::{DoclingClient, PdfExtractor, SubprocessPdfExtractor, MIN_EXTRACTED_CHARS};
pub use models::{
    AccountInfo, CategorizationFeedback, CategorizationMetrics, CategorizationMode,
    CategorizationResult, CategorizationRule, CategorizationSource, CategorizedTransaction,
    Category, CategoryType, Entity, EntityType, FeedbackOutcome, MatchType, NewEntity,
    NewFeedback, NewRule, ParseStatus, ParsedTransaction, RuleSource, StatementOutcome,
    StatementSummary, TaxRegime, TransactionType,
};
pub use parsers::ParsedStatement;
pub use pipeline::{ProcessRequest, StatementProcessor};
