//! Pluggable AI backend abstraction
//!
//! A backend-agnostic interface for the LLM calls the categorization engine
//! and the parser fallback make. Backends are plain text-completion services;
//! prompt construction and response parsing live with the callers.
//!
//! - `AIBackend` trait: the interface every backend implements
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend`, `OpenAICompatibleBackend`,
//!   `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (gemini, openai_compatible, mock). Default: gemini
//! - `GEMINI_API_KEY`: API key (required for gemini backend)
//! - `GEMINI_MODEL`: Model name (default: gemini-2.0-flash)
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible backend)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-3.5-turbo)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

mod gemini;
mod mock;
mod openai_compatible;
pub mod parsing;

pub use gemini::GeminiBackend;
pub use mock::MockBackend;
pub use openai_compatible::OpenAICompatibleBackend;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Upper bound on any single model call.
pub const AI_REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// A single text-completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Optional system instruction, sent separately where the API supports it
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_tokens: 4096,
            temperature: 0.1,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Trait defining the interface for all AI backends
///
/// Backends must be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Run a text completion and return the raw model output
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Google Gemini (generativelanguage HTTP API)
    Gemini(GeminiBackend),
    /// OpenAI-compatible backend (vLLM, LocalAI, llama-server, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Checks `AI_BACKEND` to determine which backend to use:
    /// - `gemini` (default): Uses GEMINI_API_KEY and GEMINI_MODEL
    /// - `openai_compatible`: Uses OPENAI_COMPATIBLE_HOST and OPENAI_COMPATIBLE_MODEL
    /// - `mock`: Creates a mock backend for testing
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "gemini".to_string());

        match backend.to_lowercase().as_str() {
            "gemini" => GeminiBackend::from_env().map(AIClient::Gemini),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to gemini");
                GeminiBackend::from_env().map(AIClient::Gemini)
            }
        }
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }
}

#[async_trait]
impl AIBackend for AIClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        match self {
            AIClient::Gemini(b) => b.complete(request).await,
            AIClient::OpenAICompatible(b) => b.complete(request).await,
            AIClient::Mock(b) => b.complete(request).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Gemini(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Gemini(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_client_mock() {
        let client = AIClient::mock();
        assert_eq!(client.model(), "mock");
        assert_eq!(client.host(), "mock://localhost");
    }

    #[tokio::test]
    async fn test_mock_health_check() {
        let client = AIClient::mock();
        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn test_mock_scripted_response() {
        let client = AIClient::Mock(MockBackend::new().with_response("hello"));
        let out = client
            .complete(&CompletionRequest::new("anything"))
            .await
            .unwrap();
        assert_eq!(out, "hello");
    }
}
