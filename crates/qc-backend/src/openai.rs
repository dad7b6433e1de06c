//! OpenAI chat completions adapter.

use std::time::Duration;

use async_trait::async_trait;
use qc_protocol::{CommandRequest, CommandResponse};

use crate::chat::ChatEndpoint;
use crate::{Backend, BackendError};

pub const API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-5o";

/// OpenAI API client.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    endpoint: ChatEndpoint,
}

impl OpenAiBackend {
    pub fn new(api_key: impl Into<String>) -> Result<Self, BackendError> {
        Ok(Self {
            endpoint: ChatEndpoint::new(api_key.into(), API_URL, DEFAULT_MODEL)?,
        })
    }

    /// Point the client at a different endpoint (full completions URL).
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
}

#[async_trait]
impl Backend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "openai"
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
