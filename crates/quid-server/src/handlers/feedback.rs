//! Correction feedback and learning-metrics handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use crate::{get_user_id, AppError, AppState, MAX_PAGE_LIMIT};
use quid_core::error::Error;
use quid_core::models::{
    CategorizationFeedback, CategorizationMetrics, FeedbackOutcome, NewFeedback,
};

/// Query parameters for listing feedback
#[derive(Debug, Deserialize)]
pub struct FeedbackQuery {
    /// Filter to one entity's corrections
    pub entity_id: Option<i64>,
    /// Max results (default: 50)
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// GET /api/feedback - Recent corrections, newest first
pub async fn list_feedback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<FeedbackQuery>,
) -> Result<Json<Vec<CategorizationFeedback>>, AppError> {
    let user_id = get_user_id(&headers);
    let limit = params.limit.min(MAX_PAGE_LIMIT);

    let feedback =
        state
            .db
            .list_recent_feedback(user_id.as_deref(), params.entity_id, limit)?;
    Ok(Json(feedback))
}

/// POST /api/feedback - Record a category correction
///
/// Recording may auto-learn a rule when the same keyword has been
/// corrected to the same category often enough; `rule_created` in the
/// response says whether that happened here.
pub async fn create_feedback(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(mut feedback): Json<NewFeedback>,
) -> Result<Json<FeedbackOutcome>, AppError> {
    if feedback.transaction_description.trim().is_empty() {
        return Err(AppError::bad_request(
            "transaction_description must not be empty",
        ));
    }

    if feedback.user_id.is_none() {
        feedback.user_id = get_user_id(&headers);
    }

    let (feedback_id, rule_created) =
        state.db.record_feedback(&feedback).map_err(|e| match e {
            Error::NotFound(_) => AppError::bad_request("Unknown corrected_category_id"),
            other => other.into(),
        })?;

    Ok(Json(FeedbackOutcome {
        feedback_id,
        rule_created,
    }))
}

/// GET /api/metrics/categorization - Rule and feedback counts
pub async fn categorization_metrics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CategorizationMetrics>, AppError> {
    let metrics = state.db.categorization_metrics()?;
    Ok(Json(metrics))
}
