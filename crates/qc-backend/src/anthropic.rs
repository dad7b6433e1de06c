//! Anthropic Messages API adapter.

use std::time::Duration;

use async_trait::async_trait;
use qc_protocol::{CommandRequest, CommandResponse};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::http::{build_http_client, send_json};
use crate::prompt::system_prompt;
use crate::{Backend, BackendError, DEFAULT_MAX_TOKENS, DEFAULT_TIMEOUT};

pub const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";

/// Anthropic API client.
#[derive(Debug, Clone)]
pub struct AnthropicBackend {
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
    http: Client,
}

impl AnthropicBackend {
    /// Create a client with the given API key and default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self, BackendError> {
        Ok(Self {
            api_key: api_key.into(),
            base_url: API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
            http: build_http_client()?,
        })
    }

    /// Point the client at a different endpoint (full messages URL).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Backend for AnthropicBackend {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_command(
        &self,
        request: &CommandRequest,
    ) -> Result<CommandResponse, BackendError> {
        if self.api_key.is_empty() {
            return Err(BackendError::NoApiKey);
        }
        if request.query.is_empty() {
            return Err(BackendError::EmptyQuery);
        }

        let model = if request.model.is_empty() {
            self.model.as_str()
        } else {
            request.model.as_str()
        };

        let body = MessagesRequest {
            model,
            max_tokens: self.max_tokens,
            system: system_prompt(request.context.as_ref()),
            messages: vec![ApiMessage {
                role: "user",
                content: &request.query,
            }],
        };

        let http_request = self
            .http
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body);

        let resp: MessagesResponse = send_json(http_request, self.timeout).await?;

        let command = resp
            .content
            .into_iter()
            .find_map(|block| match block {
                ResponseContentBlock::Text { text } => Some(text),
                ResponseContentBlock::Other => None,
            })
            .map(|text| text.trim().to_string())
            .unwrap_or_default();

        if command.is_empty() {
            return Err(BackendError::EmptyResponse);
        }

        let served_by = if resp.model.is_empty() {
            model.to_string()
        } else {
            resp.model
        };

        Ok(CommandResponse::new(
            command,
            served_by,
            resp.usage.total(),
        ))
    }
}

// API request/response types

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: String,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseContentBlock>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl Usage {
    fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use qc_protocol::ShellContext;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn success_body(text: &str) -> serde_json::Value {
        json!({
            "id": "msg_123",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": text}],
            "model": "claude-haiku-4-5-20251001",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 50, "output_tokens": 10}
        })
    }

    fn backend_for(server: &MockServer) -> AnthropicBackend {
        AnthropicBackend::new("test-key")
            .unwrap()
            .with_base_url(format!("{}/v1/messages", server.uri()))
    }

    #[test]
    fn usage_total_saturates() {
        let usage = Usage {
            input_tokens: 50,
            output_tokens: 10,
        };
        assert_eq!(usage.total(), 60);
        let usage = Usage {
            input_tokens: u32::MAX,
            output_tokens: 10,
        };
        assert_eq!(usage.total(), u32::MAX);
    }

    #[test]
    fn name_and_defaults() {
        let backend = AnthropicBackend::new("k").unwrap();
        assert_eq!(backend.name(), "anthropic");
        assert_eq!(backend.model(), DEFAULT_MODEL);
        assert_eq!(backend.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(backend.base_url, API_URL);
    }

    #[test]
    fn builder_overrides() {
        let backend = AnthropicBackend::new("k")
            .unwrap()
            .with_base_url("http://localhost:1/v1/messages")
            .with_model("claude-test")
            .with_max_tokens(64)
            .with_timeout(Duration::from_secs(3));
        assert_eq!(backend.base_url, "http://localhost:1/v1/messages");
        assert_eq!(backend.model(), "claude-test");
        assert_eq!(backend.max_tokens, 64);
        assert_eq!(backend.timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn generate_command_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({
                "model": "claude-haiku-4-5-20251001",
                "max_tokens": 512,
                "messages": [{"role": "user", "content": "list files"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("ls -la")))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let resp = backend
            .generate_command(&CommandRequest::new("list files"))
            .await
            .unwrap();

        assert_eq!(resp.command, "ls -la");
        assert_eq!(resp.model, "claude-haiku-4-5-20251001");
        assert_eq!(resp.tokens_used, 60);
    }

    #[tokio::test]
    async fn context_is_sent_in_system_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("pwd")))
            .mount(&server)
            .await;

        let ctx = ShellContext {
            working_dir: "/srv/app".to_string(),
            shell: "bash".to_string(),
            os: "linux".to_string(),
        };
        let backend = backend_for(&server);
        backend
            .generate_command(&CommandRequest::new("where am i").with_context(ctx))
            .await
            .unwrap();

        let received = server.received_requests().await.unwrap();
        let body: serde_json::Value = received[0].body_json().unwrap();
        let system = body["system"].as_str().unwrap();
        assert!(system.contains("Working directory: /srv/app"));
        assert!(system.contains("Shell: bash"));
        assert!(system.contains("OS: linux"));
    }

    #[tokio::test]
    async fn request_model_overrides_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"model": "claude-override"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("ls")))
            .expect(1)
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        backend
            .generate_command(&CommandRequest::new("ls").with_model("claude-override"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_api_key_and_empty_query() {
        let backend = AnthropicBackend::new("").unwrap();
        let err = backend
            .generate_command(&CommandRequest::new("ls"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NoApiKey));

        let backend = AnthropicBackend::new("k").unwrap();
        let err = backend
            .generate_command(&CommandRequest::new(""))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::EmptyQuery));
    }

    #[tokio::test]
    async fn empty_and_whitespace_responses_are_errors() {
        for content in [json!([]), json!([{"type": "text", "text": "   \n\t "}])] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "content": content,
                    "model": "m",
                    "usage": {"input_tokens": 1, "output_tokens": 0}
                })))
                .mount(&server)
                .await;

            let err = backend_for(&server)
                .generate_command(&CommandRequest::new("ls"))
                .await
                .unwrap_err();
            assert!(matches!(err, BackendError::EmptyResponse), "{err}");
        }
    }

    #[tokio::test]
    async fn response_text_is_trimmed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(success_body("\n  git status  \n")),
            )
            .mount(&server)
            .await;

        let resp = backend_for(&server)
            .generate_command(&CommandRequest::new("status"))
            .await
            .unwrap();
        assert_eq!(resp.command, "git status");
    }

    #[tokio::test]
    async fn api_error_uses_provider_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "type": "error",
                "error": {"type": "authentication_error", "message": "invalid x-api-key"}
            })))
            .mount(&server)
            .await;

        let err = backend_for(&server)
            .generate_command(&CommandRequest::new("ls"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "API error (401): invalid x-api-key");
    }

    #[tokio::test]
    async fn api_error_falls_back_to_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let err = backend_for(&server)
            .generate_command(&CommandRequest::new("ls"))
            .await
            .unwrap_err();
        match err {
            BackendError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "upstream unavailable");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(success_body("ls"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = backend_for(&server)
            .with_timeout(Duration::from_millis(50))
            .generate_command(&CommandRequest::new("ls"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Timeout), "{err:?}");
    }
}
