//! PDF text extraction.
//!
//! Two extractors, tried in order by the pipeline:
//!
//! 1. `DoclingClient` - an HTTP sidecar service doing layout-aware
//!    extraction. Only used when `DOCLING_URL` is set and the service
//!    answers its health check.
//! 2. `SubprocessPdfExtractor` - shells out to `pdftotext -layout`, the
//!    always-available fallback.
//!
//! Extraction that yields under `MIN_EXTRACTED_CHARS` characters is treated
//! as failed; scanned statements produce near-empty text and anything built
//! on it would be garbage.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::multipart;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Below this many characters the extraction is considered failed.
pub const MIN_EXTRACTED_CHARS: usize = 50;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
const EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);
const SUBPROCESS_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that can turn PDF bytes into text.
#[async_trait]
pub trait PdfExtractor: Send + Sync {
    async fn extract(&self, pdf_bytes: &[u8]) -> Result<String>;
}

/// Client for the docling extraction sidecar.
#[derive(Clone)]
pub struct DoclingClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl DoclingClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create from `DOCLING_URL` if set.
    pub fn from_env() -> Option<Self> {
        std::env::var("DOCLING_URL").ok().map(|url| Self::new(&url))
    }

    /// Quick liveness probe. A slow or absent sidecar must not stall
    /// statement processing, hence the short timeout.
    pub async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/health", self.base_url))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(err) => {
                debug!(error = %err, "docling health check failed");
                false
            }
        }
    }
}

#[async_trait]
impl PdfExtractor for DoclingClient {
    async fn extract(&self, pdf_bytes: &[u8]) -> Result<String> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(pdf_bytes);
        let form = multipart::Form::new()
            .text("file_base64", encoded)
            .text("file_name", "statement.pdf");

        let response = self
            .http_client
            .post(format!("{}/extract-bank-statement", self.base_url))
            .multipart(form)
            .timeout(EXTRACT_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::Extraction(format!(
                "docling returned {}",
                status
            )));
        }

        let body: DoclingResponse = response.json().await?;
        if body.text.trim().len() < MIN_EXTRACTED_CHARS {
            return Err(Error::Extraction(
                "could not extract enough text".into(),
            ));
        }
        Ok(body.text)
    }
}

#[derive(Debug, Deserialize)]
struct DoclingResponse {
    text: String,
}

/// Fallback extractor shelling out to `pdftotext -layout`.
pub struct SubprocessPdfExtractor {
    binary: String,
}

impl Default for SubprocessPdfExtractor {
    fn default() -> Self {
        Self {
            binary: "pdftotext".to_string(),
        }
    }
}

impl SubprocessPdfExtractor {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PdfExtractor for SubprocessPdfExtractor {
    async fn extract(&self, pdf_bytes: &[u8]) -> Result<String> {
        use tokio::io::AsyncWriteExt;

        // `-layout` preserves column alignment, which the bank parsers
        // depend on; `-` twice reads stdin and writes stdout.
        let mut child = tokio::process::Command::new(&self.binary)
            .args(["-layout", "-", "-"])
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| Error::Extraction(format!("failed to spawn {}: {}", self.binary, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Extraction("pdftotext stdin unavailable".into()))?;
        stdin
            .write_all(pdf_bytes)
            .await
            .map_err(|e| Error::Extraction(format!("pdftotext stdin write: {}", e)))?;
        drop(stdin);

        let output = tokio::time::timeout(SUBPROCESS_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| Error::Extraction("pdftotext timed out".into()))?
            .map_err(|e| Error::Extraction(format!("pdftotext: {}", e)))?;

        if !output.status.success() {
            return Err(Error::Extraction(format!(
                "pdftotext exited with {}",
                output.status
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        if text.trim().len() < MIN_EXTRACTED_CHARS {
            warn!(chars = text.trim().len(), "extraction produced too little text");
            return Err(Error::Extraction(
                "could not extract enough text".into(),
            ));
        }
        Ok(text)
    }
}

/// Fixed-output extractor for tests.
#[cfg(test)]
pub struct StubExtractor(pub String);

#[cfg(test)]
#[async_trait]
impl PdfExtractor for StubExtractor {
    async fn extract(&self, _pdf_bytes: &[u8]) -> Result<String> {
        if self.0.trim().len() < MIN_EXTRACTED_CHARS {
            return Err(Error::Extraction(
                "could not extract enough text".into(),
            ));
        }
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_rejects_short_text() {
        let stub = StubExtractor("too short".into());
        let err = stub.extract(b"%PDF-1.4").await.unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[tokio::test]
    async fn test_docling_health_check_unreachable() {
        // Nothing listens here; the probe must come back false, not hang.
        let client = DoclingClient::new("http://127.0.0.1:1");
        assert!(!client.health_check().await);
    }

    #[test]
    fn test_base_url_normalized() {
        let client = DoclingClient::new("http://docling:5001/");
        assert_eq!(client.base_url, "http://docling:5001");
    }
}
