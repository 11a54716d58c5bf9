//! Domain models for Quid

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Direction of money movement on a statement line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money in
    Credit,
    /// Money out
    Debit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a category receives money in or money out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Income,
    Expense,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// The category type a transaction of the given type may legally receive.
    /// Credits only ever map to income categories, debits to expense categories.
    pub fn for_transaction(tx_type: TransactionType) -> Self {
        match tx_type {
            TransactionType::Credit => Self::Income,
            TransactionType::Debit => Self::Expense,
        }
    }
}

impl std::str::FromStr for CategoryType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown category type: {}", s)),
        }
    }
}

impl std::fmt::Display for CategoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// UK tax regime the owning entity files under
///
/// Selects the category taxonomy, the layer-1 rule set, and the AI prompt
/// variant used during categorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaxRegime {
    /// Individual / sole trader — HMRC Self Assessment (SA103)
    #[default]
    Hmrc,
    /// Company — Companies House statutory accounts / CT600
    CompaniesHouse,
}

impl TaxRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hmrc => "hmrc",
            Self::CompaniesHouse => "companies_house",
        }
    }

    /// Map an entity type to its filing regime. Company-like entities file
    /// with Companies House; everything else (including an unknown or
    /// missing entity) defaults to HMRC self-assessment.
    pub fn for_entity_type(entity_type: EntityType) -> Self {
        match entity_type {
            EntityType::LimitedCompany | EntityType::Llp | EntityType::Partnership => {
                Self::CompaniesHouse
            }
            EntityType::Individual | EntityType::SoleTrader => Self::Hmrc,
        }
    }
}

impl std::str::FromStr for TaxRegime {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hmrc" => Ok(Self::Hmrc),
            "companies_house" | "companieshouse" => Ok(Self::CompaniesHouse),
            _ => Err(format!("Unknown tax regime: {}", s)),
        }
    }
}

impl std::fmt::Display for TaxRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Legal form of the entity that owns a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    #[default]
    Individual,
    SoleTrader,
    LimitedCompany,
    Llp,
    Partnership,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::SoleTrader => "sole_trader",
            Self::LimitedCompany => "limited_company",
            Self::Llp => "llp",
            Self::Partnership => "partnership",
        }
    }
}

impl std::str::FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "individual" => Ok(Self::Individual),
            "sole_trader" | "soletrader" => Ok(Self::SoleTrader),
            "limited_company" | "ltd" => Ok(Self::LimitedCompany),
            "llp" => Ok(Self::Llp),
            "partnership" => Ok(Self::Partnership),
            _ => Err(format!("Unknown entity type: {}", s)),
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a categorization rule keyword is tested against a description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Case-insensitive substring
    #[default]
    Contains,
    /// Case-insensitive full match
    Exact,
    /// Case-insensitive prefix
    StartsWith,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Exact => "exact",
            Self::StartsWith => "starts_with",
        }
    }
}

impl std::str::FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contains" => Ok(Self::Contains),
            "exact" => Ok(Self::Exact),
            "starts_with" | "startswith" => Ok(Self::StartsWith),
            _ => Err(format!("Unknown match type: {}", s)),
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a categorization rule came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    /// Seeded from the built-in per-regime keyword tables
    System,
    /// Created explicitly by a user
    #[default]
    User,
    /// Generated automatically from repeated user corrections
    AutoLearned,
}

impl RuleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::AutoLearned => "auto_learned",
        }
    }
}

impl std::str::FromStr for RuleSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(Self::System),
            "user" | "manual" => Ok(Self::User),
            "auto_learned" | "autolearned" => Ok(Self::AutoLearned),
            _ => Err(format!("Unknown rule source: {}", s)),
        }
    }
}

impl std::fmt::Display for RuleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which engine layer produced a categorization result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CategorizationSource {
    /// Layer 1: deterministic rule
    Rule,
    /// Layer 2: learned pattern from user corrections
    Pattern,
    /// Layer 3: AI batch classification
    Ai,
    /// Layer 4: nothing matched
    #[default]
    None,
}

impl CategorizationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::Pattern => "pattern",
            Self::Ai => "ai",
            Self::None => "none",
        }
    }
}

impl std::str::FromStr for CategorizationSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rule" => Ok(Self::Rule),
            "pattern" => Ok(Self::Pattern),
            "ai" => Ok(Self::Ai),
            "none" => Ok(Self::None),
            _ => Err(format!("Unknown categorization source: {}", s)),
        }
    }
}

impl std::fmt::Display for CategorizationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-user auto-approval posture
///
/// Controls only the `needs_review`/`auto_approved` flags on results, never
/// which layer produces the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CategorizationMode {
    /// Nothing auto-approved, everything reviewed
    Conservative,
    /// Auto-approve at >= 90% confidence, review below
    #[default]
    Smart,
    /// Auto-approve anything categorized, review only < 50% confidence
    Autonomous,
}

impl CategorizationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Smart => "smart",
            Self::Autonomous => "autonomous",
        }
    }
}

impl std::str::FromStr for CategorizationMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "conservative" => Ok(Self::Conservative),
            "smart" => Ok(Self::Smart),
            "autonomous" => Ok(Self::Autonomous),
            _ => Err(format!("Unknown categorization mode: {}", s)),
        }
    }
}

impl std::fmt::Display for CategorizationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of statement ingestion as a whole
///
/// The single authoritative signal callers use to decide whether to prompt
/// a human: `success` is safe to file, `needs_review` means check the
/// transactions, `failed` means re-upload or try another format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStatus {
    Success,
    NeedsReview,
    Failed,
}

impl ParseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NeedsReview => "needs_review",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ParseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A transaction as produced by one of the statement parsers
///
/// Immutable once parsed; the categorization engine attaches derived fields
/// via [`CategorizedTransaction`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub date: NaiveDate,
    /// Raw merchant/narrative text from the statement
    pub description: String,
    /// Unsigned amount in GBP; direction lives in `transaction_type`
    pub amount: f64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Running balance after this transaction, when the statement shows one
    pub balance: Option<f64>,
    /// Bank reference or transaction id, when present
    pub reference: Option<String>,
    /// Dedup key over date/description/amount
    pub import_hash: String,
}

/// A parsed transaction plus the engine's categorization verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizedTransaction {
    #[serde(flatten)]
    pub transaction: ParsedTransaction,
    pub suggested_category_id: Option<i64>,
    pub suggested_category_name: Option<String>,
    pub confidence_score: f64,
    pub categorization_source: CategorizationSource,
    pub needs_review: bool,
    pub auto_approved: bool,
    /// Free-text justification (rule keyword, pattern provenance, or AI reasoning)
    pub reasoning: Option<String>,
}

/// A category in one regime's fixed taxonomy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub category_type: CategoryType,
    pub regime: TaxRegime,
}

/// A stored categorization rule (layer 1)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizationRule {
    pub id: i64,
    pub keyword: String,
    pub match_type: MatchType,
    pub category_id: i64,
    /// Resolved from the category row; kept on the rule so matching can
    /// enforce type consistency without a second lookup.
    pub category_name: String,
    pub category_type: CategoryType,
    /// Restrict the rule to credits or debits; `None` means both
    pub transaction_type: Option<TransactionType>,
    /// Higher wins on conflict
    pub priority: i64,
    pub source: RuleSource,
    pub confidence: f64,
    pub auto_approve: bool,
    pub is_active: bool,
    /// `None` = global system rule
    pub user_id: Option<String>,
    pub entity_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a rule
#[derive(Debug, Clone, Deserialize)]
pub struct NewRule {
    pub keyword: String,
    #[serde(default)]
    pub match_type: MatchType,
    pub category_id: i64,
    #[serde(default)]
    pub transaction_type: Option<TransactionType>,
    #[serde(default = "default_rule_priority")]
    pub priority: i64,
    #[serde(default)]
    pub source: RuleSource,
    #[serde(default = "default_rule_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub auto_approve: bool,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub entity_id: Option<i64>,
}

impl NewRule {
    /// A plain user rule for a category, with defaults matching the
    /// deserialization defaults above.
    pub fn for_category(category_id: i64) -> Self {
        Self {
            keyword: String::new(),
            match_type: MatchType::Contains,
            category_id,
            transaction_type: None,
            priority: default_rule_priority(),
            source: RuleSource::User,
            confidence: default_rule_confidence(),
            auto_approve: false,
            user_id: None,
            entity_id: None,
        }
    }
}

fn default_rule_priority() -> i64 {
    10
}

fn default_rule_confidence() -> f64 {
    1.0
}

/// Bank and account metadata extracted once per statement
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountInfo {
    pub bank_name: String,
    pub sort_code: Option<String>,
    /// Masked / last digits only
    pub account_number: Option<String>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

/// Statement-level totals
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StatementSummary {
    pub total_credits: f64,
    pub total_debits: f64,
}

/// The legal/taxable person or company owning a statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: i64,
    pub name: String,
    pub entity_type: EntityType,
    pub ni_number: Option<String>,
    pub utr: Option<String>,
    pub vat_number: Option<String>,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating an entity
#[derive(Debug, Clone, Deserialize)]
pub struct NewEntity {
    pub name: String,
    pub entity_type: EntityType,
    #[serde(default)]
    pub ni_number: Option<String>,
    #[serde(default)]
    pub utr: Option<String>,
    #[serde(default)]
    pub vat_number: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// A recorded user correction (the engine's training signal)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizationFeedback {
    pub id: i64,
    /// Description text of the corrected transaction
    pub transaction_description: String,
    pub transaction_type: TransactionType,
    pub amount: Option<f64>,
    /// What the engine suggested, if anything
    pub suggested_category_id: Option<i64>,
    pub corrected_category_id: i64,
    pub corrected_category_name: String,
    pub user_id: Option<String>,
    pub entity_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Fields for recording feedback
#[derive(Debug, Clone, Deserialize)]
pub struct NewFeedback {
    pub transaction_description: String,
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub suggested_category_id: Option<i64>,
    pub corrected_category_id: i64,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub entity_id: Option<i64>,
}

/// Result of recording feedback
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackOutcome {
    pub feedback_id: i64,
    /// True when the correction triggered auto-learning of a new rule
    pub rule_created: bool,
}

/// Verdict of the 4-layer engine for one transaction
#[derive(Debug, Clone, Serialize)]
pub struct CategorizationResult {
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub confidence: f64,
    pub source: CategorizationSource,
    pub reasoning: String,
    pub auto_approve: bool,
    pub needs_review: bool,
    /// Matched rule, when layer 1 fired
    pub rule_id: Option<i64>,
}

impl CategorizationResult {
    /// The layer-4 fallback: no category, flagged for review.
    pub fn no_match() -> Self {
        Self {
            category_id: None,
            category_name: None,
            confidence: 0.0,
            source: CategorizationSource::None,
            reasoning: "No matching rule, pattern, or AI suggestion".to_string(),
            auto_approve: false,
            needs_review: true,
            rule_id: None,
        }
    }
}

/// Unified response for one processed statement
#[derive(Debug, Clone, Serialize)]
pub struct StatementOutcome {
    pub transactions: Vec<CategorizedTransaction>,
    pub account_info: Option<AccountInfo>,
    pub summary: Option<StatementSummary>,
    pub extracted_text: String,
    pub parse_status: ParseStatus,
    pub parse_error: Option<String>,
    pub entity_id: Option<i64>,
}

impl StatementOutcome {
    /// A terminal failure, still in the uniform response shape.
    pub fn failed(extracted_text: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            transactions: Vec::new(),
            account_info: None,
            summary: None,
            extracted_text: extracted_text.into(),
            parse_status: ParseStatus::Failed,
            parse_error: Some(error.into()),
            entity_id: None,
        }
    }
}

/// Rule/feedback counts for a user
#[derive(Debug, Clone, Serialize)]
pub struct CategorizationMetrics {
    pub total_rules: i64,
    pub system_rules: i64,
    pub user_rules: i64,
    pub auto_learned_rules: i64,
    pub total_feedback: i64,
}
