//! OpenAI-compatible backend implementation
//!
//! Works with any server that implements the OpenAI chat completions API:
//! vLLM, LocalAI, llama-server / llama.cpp, text-generation-inference.
//!
//! # Configuration
//!
//! Environment variables:
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-3.5-turbo)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{AIBackend, CompletionRequest, AI_REQUEST_TIMEOUT};

#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAICompatibleBackend {
    pub fn new(base_url: &str, model: &str) -> Self {
        let http_client = Client::builder()
            .timeout(AI_REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
        }
    }

    /// Create from environment variables
    ///
    /// Required: `OPENAI_COMPATIBLE_HOST`
    /// Optional: `OPENAI_COMPATIBLE_MODEL` (default: gpt-3.5-turbo)
    /// Optional: `OPENAI_COMPATIBLE_API_KEY`
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OPENAI_COMPATIBLE_HOST").ok()?;
        let model = std::env::var("OPENAI_COMPATIBLE_MODEL")
            .unwrap_or_else(|_| "gpt-3.5-turbo".to_string());

        let mut backend = Self::new(&host, &model);
        backend.api_key = std::env::var("OPENAI_COMPATIBLE_API_KEY").ok();
        Some(backend)
    }
}

#[async_trait]
impl AIBackend for OpenAICompatibleBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let mut messages = Vec::new();
        if let Some(ref system) = request.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(request.temperature),
            max_tokens: Some(request.max_tokens),
            stream: false,
        };

        let mut req_builder = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&body);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::InvalidData(format!(
                "OpenAI API error {}: {}",
                status, text
            )));
        }

        let chat_response: ChatCompletionResponse = response.json().await?;
        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::InvalidData("No response from OpenAI API".into()))
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/v1/models", self.base_url))
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}
