//! Category taxonomy handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{AppError, AppState};
use quid_core::models::{Category, TaxRegime};

/// Query parameters for listing categories
#[derive(Debug, Deserialize)]
pub struct CategoriesQuery {
    /// Tax regime (`hmrc` or `companies_house`); defaults to hmrc
    pub regime: Option<String>,
}

/// GET /api/categories - List the seeded taxonomy for a regime
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CategoriesQuery>,
) -> Result<Json<Vec<Category>>, AppError> {
    let regime = match params.regime.as_deref() {
        Some(s) => s
            .parse::<TaxRegime>()
            .map_err(|_| AppError::bad_request("Unknown tax regime"))?,
        None => TaxRegime::Hmrc,
    };

    let categories = state.db.list_categories(regime)?;
    Ok(Json(categories))
}
