//! OpenRouter adapter. OpenRouter speaks the OpenAI chat completions format
//! and additionally takes attribution headers.

use std::time::Duration;

use async_trait::async_trait;
use qc_protocol::{CommandRequest, CommandResponse};

use crate::chat::ChatEndpoint;
use crate::{Backend, BackendError};

pub const API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "anthropic/claude-haiku-4-5-20251001";
pub const DEFAULT_HTTP_REFERER: &str = "https://github.com/user/qcmd";
pub const DEFAULT_TITLE: &str = "qcmd";

/// OpenRouter API client.
#[derive(Debug, Clone)]
pub struct OpenRouterBackend {
    endpoint: ChatEndpoint,
}

impl OpenRouterBackend {
    pub fn new(api_key: impl Into<String>) -> Result<Self, BackendError> {
        let mut endpoint = ChatEndpoint::new(api_key.into(), API_URL, DEFAULT_MODEL)?;
        endpoint.set_header("HTTP-Referer", DEFAULT_HTTP_REFERER.to_string());
        endpoint.set_header("X-Title", DEFAULT_TITLE.to_string());
        Ok(Self { endpoint })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.endpoint.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.endpoint.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.endpoint.timeout = timeout;
        self
    }

    pub fn with_http_referer(mut self, referer: impl Into<String>) -> Self {
        self.endpoint.set_header("HTTP-Referer", referer.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.endpoint.set_header("X-Title", title.into());
        self
    }
}

#[async_trait]
impl Backend for OpenRouterBackend {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    fn model(&self) -> &str {
        &self.endpoint.model
    }

    async fn generate_command(
        &self,
        request: &CommandRequest,
    ) -> Result<CommandResponse, BackendError> {
        self.endpoint.generate(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn success_body(text: &str) -> serde_json::Value {
        json!({
            "id": "gen-1",
            "model": "anthropic/claude-haiku-4-5-20251001",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": text}}],
            "usage": {"prompt_tokens": 30, "completion_tokens": 5, "total_tokens": 35}
        })
    }

    fn backend_for(server: &MockServer) -> OpenRouterBackend {
        OpenRouterBackend::new("or-key")
            .unwrap()
            .with_base_url(format!("{}/api/v1/chat/completions", server.uri()))
    }

    #[test]
    fn name_and_defaults() {
        let backend = OpenRouterBackend::new("k").unwrap();
        assert_eq!(backend.name(), "openrouter");
        assert_eq!(backend.model(), DEFAULT_MODEL);
        assert_eq!(backend.endpoint.base_url, API_URL);
    }

    #[tokio::test]
    async fn sends_attribution_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer or-key"))
            .and(header("HTTP-Referer", DEFAULT_HTTP_REFERER))
            .and(header("X-Title", DEFAULT_TITLE))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("df -h")))
            .expect(1)
            .mount(&server)
            .await;

        let resp = backend_for(&server)
            .generate_command(&CommandRequest::new("disk usage"))
            .await
            .unwrap();
        assert_eq!(resp.command, "df -h");
        assert_eq!(resp.tokens_used, 35);
    }

    #[tokio::test]
    async fn custom_headers_replace_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("HTTP-Referer", "https://example.org"))
            .and(header("X-Title", "custom"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("ls")))
            .expect(1)
            .mount(&server)
            .await;

        backend_for(&server)
            .with_http_referer("https://example.org")
            .with_title("custom")
            .generate_command(&CommandRequest::new("ls"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn whitespace_only_content_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("  \n ")))
            .mount(&server)
            .await;

        let err = backend_for(&server)
            .generate_command(&CommandRequest::new("ls"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::EmptyResponse));
    }
}
