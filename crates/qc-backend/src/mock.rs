//! Mock backend for testing.
//!
//! Replays a scripted queue of responses and records every request, so
//! orchestration can be tested without HTTP.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use qc_protocol::{CommandRequest, CommandResponse};
use tokio::time::sleep;

use crate::{Backend, BackendError};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return this command text verbatim.
    Command(String),
    /// Fail with `BackendError::EmptyResponse`.
    Empty,
    /// Fail with `BackendError::Api`.
    Api { status: u16, message: String },
    /// Fail with `BackendError::Timeout`.
    Timeout,
}

impl MockResponse {
    pub fn command(text: impl Into<String>) -> Self {
        MockResponse::Command(text.into())
    }
}

#[derive(Debug)]
pub struct MockBackend {
    name: &'static str,
    model: String,
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<CommandRequest>>,
    delay: Option<Duration>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl MockBackend {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            name: "mock",
            model: "mock-model".to_string(),
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// A backend whose first reply is `command`.
    pub fn replying(command: impl Into<String>) -> Self {
        Self::new(vec![MockResponse::command(command)])
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sleep before answering (for timeout tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<CommandRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_command(
        &self,
        request: &CommandRequest,
    ) -> Result<CommandResponse, BackendError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if let Some(delay) = self.delay {
            sleep(delay).await;
        }

        let next = self
            .responses
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front());

        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };

        match next {
            Some(MockResponse::Command(command)) => {
                let tokens = (request.query.len() + command.len()) as u32;
                Ok(CommandResponse::new(command, model, tokens))
            }
            Some(MockResponse::Api { status, message }) => {
                Err(BackendError::Api { status, message })
            }
            Some(MockResponse::Timeout) => Err(BackendError::Timeout),
            Some(MockResponse::Empty) | None => Err(BackendError::EmptyResponse),
        }
    }
}
