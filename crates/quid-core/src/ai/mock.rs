//! Mock backend for tests.
//!
//! Responses are scripted with `with_response`; each call to `complete` pops
//! the next one. With an empty queue it returns an empty JSON array, which
//! the callers treat as "no matches".

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::Result;

use super::{AIBackend, CompletionRequest};

#[derive(Clone)]
pub struct MockBackend {
    responses: Arc<Mutex<VecDeque<String>>>,
    prompts: Arc<Mutex<Vec<CompletionRequest>>>,
    healthy: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            healthy: true,
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Queue a scripted response.
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push_back(response.into());
        self
    }

    /// Requests seen so far, for asserting on prompt contents.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.prompts.lock().unwrap().push(request.clone());
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "[]".to_string()))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_responses_pop_in_order() {
        let backend = MockBackend::new().with_response("one").with_response("two");
        let req = CompletionRequest::new("p");
        assert_eq!(backend.complete(&req).await.unwrap(), "one");
        assert_eq!(backend.complete(&req).await.unwrap(), "two");
        assert_eq!(backend.complete(&req).await.unwrap(), "[]");
        assert_eq!(backend.requests().len(), 3);
    }
}
