//! Statement upload and processing handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::{get_user_id, AppState};
use quid_core::models::{CategorizationMode, StatementOutcome};
use quid_core::pipeline::ProcessRequest;

/// Request-level failure on the statement endpoint. Renders as a 400 whose
/// body is still a `StatementOutcome` with `parse_status=failed`, so callers
/// handle one response shape no matter what went wrong.
pub struct UploadError(String);

impl UploadError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(StatementOutcome::failed(String::new(), self.0)),
        )
            .into_response()
    }
}

/// POST /api/statements/process - Upload a statement and run the pipeline
///
/// Multipart fields:
/// - `file` (required): the statement (PDF, CSV, or plain text)
/// - `entity_id` (optional): entity the statement belongs to; steers the
///   tax regime used for categorization
/// - `mode` (optional): `conservative`, `smart`, or `autonomous`
/// - `cloud_storage_path` (optional): accepted for compatibility, ignored
///
/// The response body is always a `StatementOutcome`: parse and extraction
/// failures report through `parse_status` / `parse_error` at 200, and even
/// malformed requests (missing file, bad `entity_id`) answer 400 with the
/// same shape rather than a separate error schema.
pub async fn process_statement(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<StatementOutcome>, UploadError> {
    let mut file: Option<(String, Option<String>, Vec<u8>)> = None;
    let mut entity_id: Option<i64> = None;
    let mut mode = CategorizationMode::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::new(format!("Invalid multipart payload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("statement").to_string();
                let content_type = field.content_type().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| UploadError::new(format!("Failed to read file: {}", e)))?;
                file = Some((filename, content_type, bytes.to_vec()));
            }
            "entity_id" => {
                let text = field.text().await.unwrap_or_default();
                entity_id = Some(
                    text.trim()
                        .parse()
                        .map_err(|_| UploadError::new("entity_id must be an integer"))?,
                );
            }
            "mode" => {
                let text = field.text().await.unwrap_or_default();
                mode = text
                    .trim()
                    .parse()
                    .map_err(|_| UploadError::new("Unknown categorization mode"))?;
            }
            _ => {}
        }
    }

    let (filename, content_type, bytes) =
        file.ok_or_else(|| UploadError::new("Missing file field"))?;
    if bytes.is_empty() {
        return Err(UploadError::new("Uploaded file is empty"));
    }

    let request = ProcessRequest {
        filename,
        content_type,
        entity_id,
        user_id: get_user_id(&headers),
        mode,
    };

    let outcome = state.processor.process(&bytes, &request).await;
    info!(
        filename = %request.filename,
        status = outcome.parse_status.as_str(),
        transactions = outcome.transactions.len(),
        "statement processed"
    );

    Ok(Json(outcome))
}
