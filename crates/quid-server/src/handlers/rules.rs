//! Categorization rule handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;

use crate::{get_user_id, AppError, AppState, SuccessResponse};
use quid_core::error::Error;
use quid_core::models::{CategorizationRule, NewRule, TaxRegime};

/// Query parameters for listing rules
#[derive(Debug, Deserialize)]
pub struct RulesQuery {
    /// Filter to one tax regime; omit for all rules
    pub regime: Option<String>,
}

/// GET /api/rules - List rules (active and inactive), newest first
pub async fn list_rules(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RulesQuery>,
) -> Result<Json<Vec<CategorizationRule>>, AppError> {
    let regime = match params.regime.as_deref() {
        Some(s) => Some(
            s.parse::<TaxRegime>()
                .map_err(|_| AppError::bad_request("Unknown tax regime"))?,
        ),
        None => None,
    };

    let rules = state.db.list_rules(regime)?;
    Ok(Json(rules))
}

/// POST /api/rules - Create a user rule
pub async fn create_rule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(mut rule): Json<NewRule>,
) -> Result<(StatusCode, Json<CategorizationRule>), AppError> {
    if rule.keyword.trim().is_empty() {
        return Err(AppError::bad_request("Rule keyword must not be empty"));
    }
    if !(0.0..=1.0).contains(&rule.confidence) {
        return Err(AppError::bad_request(
            "Rule confidence must be between 0 and 1",
        ));
    }

    // Scope the rule to the calling user unless the body says otherwise
    if rule.user_id.is_none() {
        rule.user_id = get_user_id(&headers);
    }

    let created = state.db.create_rule(&rule).map_err(|e| match e {
        Error::NotFound(_) => AppError::bad_request("Unknown category_id"),
        other => other.into(),
    })?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /api/rules/:id - Deactivate a rule (soft delete)
pub async fn delete_rule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.deactivate_rule(id).map_err(|e| match e {
        Error::NotFound(_) => AppError::not_found("Rule not found"),
        other => other.into(),
    })?;

    Ok(Json(SuccessResponse { success: true }))
}
