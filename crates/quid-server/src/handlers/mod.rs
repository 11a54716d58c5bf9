//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod categories;
pub mod entities;
pub mod feedback;
pub mod rules;
pub mod statements;

// Re-export all handlers for use in router
pub use categories::*;
pub use entities::*;
pub use feedback::*;
pub use rules::*;
pub use statements::*;

use axum::Json;

/// GET /health - Liveness probe
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
