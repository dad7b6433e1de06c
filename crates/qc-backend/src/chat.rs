//! OpenAI-compatible chat completions, shared by the OpenAI and OpenRouter
//! adapters.

use std::time::Duration;

use qc_protocol::{CommandRequest, CommandResponse};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::http::{build_http_client, send_json};
use crate::prompt::system_prompt;
use crate::{BackendError, DEFAULT_MAX_TOKENS, DEFAULT_TIMEOUT};

#[derive(Debug, Clone)]
pub(crate) struct ChatEndpoint {
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) model: String,
    pub(crate) max_tokens: u32,
    pub(crate) timeout: Duration,
    /// Extra headers sent with every request, in insertion order.
    pub(crate) headers: Vec<(&'static str, String)>,
    http: Client,
}

impl ChatEndpoint {
    pub(crate) fn new(
        api_key: String,
        base_url: &str,
        model: &str,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            api_key,
            base_url: base_url.to_string(),
            model: model.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
            headers: Vec::new(),
            http: build_http_client()?,
        })
    }

    /// Set or replace an extra header.
    pub(crate) fn set_header(&mut self, name: &'static str, value: String) {
        match self.headers.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name, value)),
        }
    }

    pub(crate) async fn generate(
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

        let system = system_prompt(request.context.as_ref());
        let body = ChatRequest {
            model,
            max_tokens: self.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.query,
                },
            ],
        };

        let mut http_request = self
            .http
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&body);
        for (name, value) in &self.headers {
            http_request = http_request.header(*name, value);
        }

        let resp: ChatResponse = send_json(http_request, self.timeout).await?;

        let command = resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
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

        Ok(CommandResponse::new(command, served_by, resp.usage.total()))
    }
}

// API request/response types

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: ChatUsage,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

impl ChatUsage {
    fn total(&self) -> u32 {
        if self.total_tokens > 0 {
            self.total_tokens
        } else {
            self.prompt_tokens.saturating_add(self.completion_tokens)
        }
    }
}
