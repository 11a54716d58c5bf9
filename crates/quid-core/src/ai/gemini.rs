//! Google Gemini backend implementation
//!
//! Talks to the `generativelanguage.googleapis.com` generateContent API.
//!
//! # Configuration
//!
//! Environment variables:
//! - `GEMINI_API_KEY`: API key (required)
//! - `GEMINI_MODEL`: Model name (default: gemini-2.0-flash)
//! - `GEMINI_HOST`: Override the API host, mainly for tests (optional)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::{AIBackend, CompletionRequest, AI_REQUEST_TIMEOUT};

const DEFAULT_HOST: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    host: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_host(DEFAULT_HOST, api_key, model)
    }

    pub fn with_host(host: &str, api_key: &str, model: &str) -> Self {
        let http_client = Client::builder()
            .timeout(AI_REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            host: host.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Create from environment variables
    ///
    /// Required: `GEMINI_API_KEY`
    /// Optional: `GEMINI_MODEL` (default: gemini-2.0-flash), `GEMINI_HOST`
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok()?;
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let host = std::env::var("GEMINI_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        Some(Self::with_host(&host, &api_key, &model))
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.host, self.model, self.api_key
        )
    }
}

#[async_trait]
impl AIBackend for GeminiBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
            }],
            system_instruction: request.system.as_ref().map(|s| Content {
                parts: vec![Part { text: s.clone() }],
            }),
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        };

        debug!(model = %self.model, prompt_len = request.prompt.len(), "gemini request");

        let response = self
            .http_client
            .post(self.generate_url())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::InvalidData(format!(
                "Gemini API error {}: {}",
                status, text
            )));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| Error::InvalidData("No candidates in Gemini response".into()))
    }

    async fn health_check(&self) -> bool {
        let url = format!(
            "{}/v1beta/models/{}?key={}",
            self.host, self.model, self.api_key
        );
        match self
            .http_client
            .get(url)
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
        &self.host
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_url() {
        let backend = GeminiBackend::with_host("http://localhost:9999/", "k", "gemini-2.0-flash");
        assert_eq!(
            backend.generate_url(),
            "http://localhost:9999/v1beta/models/gemini-2.0-flash:generateContent?key=k"
        );
    }

    #[test]
    fn test_request_serialization_shape() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: "hi".into(),
                }],
            }],
            system_instruction: None,
            generation_config: GenerationConfig {
                temperature: 0.1,
                max_output_tokens: 16000,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 16000);
        assert!(json.get("systemInstruction").is_none());
    }
}
