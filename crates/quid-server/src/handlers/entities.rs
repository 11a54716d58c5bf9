//! Tax entity handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::{get_user_id, AppError, AppState};
use quid_core::error::Error;
use quid_core::models::{Entity, NewEntity};

/// GET /api/entities - List all entities
pub async fn list_entities(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Entity>>, AppError> {
    let entities = state.db.list_entities()?;
    Ok(Json(entities))
}

/// GET /api/entities/:id - Fetch one entity
pub async fn get_entity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Entity>, AppError> {
    let entity = state.db.get_entity(id).map_err(|e| match e {
        Error::NotFound(_) => AppError::not_found("Entity not found"),
        other => other.into(),
    })?;
    Ok(Json(entity))
}

/// POST /api/entities - Create an entity
pub async fn create_entity(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(mut entity): Json<NewEntity>,
) -> Result<(StatusCode, Json<Entity>), AppError> {
    if entity.name.trim().is_empty() {
        return Err(AppError::bad_request("Entity name must not be empty"));
    }

    if entity.user_id.is_none() {
        entity.user_id = get_user_id(&headers);
    }

    let created = state.db.create_entity(&entity)?;
    Ok((StatusCode::CREATED, Json(created)))
}
