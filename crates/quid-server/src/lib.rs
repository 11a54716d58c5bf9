//! Quid Web Server
//!
//! Axum-based REST API around the statement processing pipeline:
//! statement uploads, category taxonomies, categorization rules,
//! correction feedback, and entities.
//!
//! Authentication is delegated to whatever sits in front of the server;
//! an optional `x-user-id` header scopes rules and feedback per user.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use quid_core::ai::{AIBackend, AIClient};
use quid_core::db::Database;
use quid_core::extract::{DoclingClient, PdfExtractor, SubprocessPdfExtractor};
use quid_core::pipeline::StatementProcessor;

mod handlers;

/// Maximum statement upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Maximum feedback page size
pub const MAX_PAGE_LIMIT: usize = 200;

/// Header carrying the caller's user identifier, set by the proxy in
/// front of the server. Absent in local development.
const USER_ID_HEADER: &str = "x-user-id";

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub processor: StatementProcessor,
}

/// Extract the calling user's identifier from request headers.
pub fn get_user_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the application router
pub fn create_router(db: Database) -> Router {
    let ai = AIClient::from_env();
    if let Some(ref client) = ai {
        info!(
            "AI backend configured: {} (model: {})",
            client.host(),
            client.model()
        );
    } else {
        info!("ℹ️  AI backend not configured (set GEMINI_API_KEY or OPENAI_COMPATIBLE_HOST to enable AI categorization)");
    }

    let docling = DoclingClient::from_env();
    if docling.is_none() {
        info!("ℹ️  Docling extraction not configured (set DOCLING_URL); PDF uploads use pdftotext");
    }

    create_router_with_options(db, ai, docling, Arc::new(SubprocessPdfExtractor::new()))
}

/// Create the application router with explicit components (for testing)
pub fn create_router_with_options(
    db: Database,
    ai: Option<AIClient>,
    docling: Option<DoclingClient>,
    pdf_fallback: Arc<dyn PdfExtractor>,
) -> Router {
    let processor = StatementProcessor::new(db.clone(), ai, docling, pdf_fallback);

    let state = Arc::new(AppState { db, processor });

    let api_routes = Router::new()
        // Statement processing
        .route("/statements/process", post(handlers::process_statement))
        // Category taxonomies
        .route("/categories", get(handlers::list_categories))
        // Categorization rules
        .route(
            "/rules",
            get(handlers::list_rules).post(handlers::create_rule),
        )
        .route("/rules/:id", delete(handlers::delete_rule))
        // Correction feedback and learning metrics
        .route(
            "/feedback",
            get(handlers::list_feedback).post(handlers::create_feedback),
        )
        .route(
            "/metrics/categorization",
            get(handlers::categorization_metrics),
        )
        // Entities
        .route(
            "/entities",
            get(handlers::list_entities).post(handlers::create_entity),
        )
        .route("/entities/:id", get(handlers::get_entity));

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the server
pub async fn serve(db: Database, host: &str, port: u16) -> anyhow::Result<()> {
    check_ai_connection().await;

    let app = create_router(db);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log AI backend connection status
async fn check_ai_connection() {
    match AIClient::from_env() {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "✅ AI backend connected: {} (model: {})",
                    client.host(),
                    client.model()
                );
            } else {
                warn!(
                    "⚠️  AI backend configured but not responding: {} (model: {})",
                    client.host(),
                    client.model()
                );
            }
        }
        None => {
            info!("ℹ️  AI backend not configured; statement parsing falls back to layout parsers only");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
