//! qc-backend: LLM provider adapters for qcmd.
//!
//! Every provider sits behind the [`Backend`] trait and turns a
//! [`CommandRequest`] into a single raw command string. Anthropic uses the
//! Messages API; OpenAI and OpenRouter share the chat completions format.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use qc_protocol::{CommandRequest, CommandResponse};

pub mod anthropic;
mod chat;
pub mod error;
mod http;
pub mod mock;
pub mod openai;
pub mod openrouter;
pub mod prompt;

pub use anthropic::AnthropicBackend;
pub use error::BackendError;
pub use mock::{MockBackend, MockResponse};
pub use openai::OpenAiBackend;
pub use openrouter::OpenRouterBackend;

pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A command-generation provider.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Backend identifier for logging.
    fn name(&self) -> &'static str;

    /// Model used when the request does not override it.
    fn model(&self) -> &str;

    /// Send the query and return the raw command text.
    async fn generate_command(
        &self,
        request: &CommandRequest,
    ) -> Result<CommandResponse, BackendError>;
}

// --- Backend selection ---

/// The supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Anthropic,
    OpenAi,
    OpenRouter,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [
        BackendKind::Anthropic,
        BackendKind::OpenAi,
        BackendKind::OpenRouter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Anthropic => "anthropic",
            BackendKind::OpenAi => "openai",
            BackendKind::OpenRouter => "openrouter",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_env(self) -> &'static str {
        match self {
            BackendKind::Anthropic => "ANTHROPIC_API_KEY",
            BackendKind::OpenAi => "OPENAI_API_KEY",
            BackendKind::OpenRouter => "OPENROUTER_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            BackendKind::Anthropic => anthropic::DEFAULT_MODEL,
            BackendKind::OpenAi => openai::DEFAULT_MODEL,
            BackendKind::OpenRouter => openrouter::DEFAULT_MODEL,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BackendKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| BackendError::UnknownBackend(s.to_string()))
    }
}

/// Settings needed to construct any provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSettings {
    pub api_key: String,
    /// Empty means the provider default.
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: String::new(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Construct the provider for `kind`.
pub fn build(
    kind: BackendKind,
    settings: BackendSettings,
) -> Result<Box<dyn Backend>, BackendError> {
    let model = if settings.model.is_empty() {
        kind.default_model().to_string()
    } else {
        settings.model
    };

    let backend: Box<dyn Backend> = match kind {
        BackendKind::Anthropic => Box::new(
            AnthropicBackend::new(settings.api_key)?
                .with_model(model)
                .with_max_tokens(settings.max_tokens)
                .with_timeout(settings.timeout),
        ),
        BackendKind::OpenAi => Box::new(
            OpenAiBackend::new(settings.api_key)?
                .with_model(model)
                .with_max_tokens(settings.max_tokens)
                .with_timeout(settings.timeout),
        ),
        BackendKind::OpenRouter => Box::new(
            OpenRouterBackend::new(settings.api_key)?
                .with_model(model)
                .with_max_tokens(settings.max_tokens)
                .with_timeout(settings.timeout),
        ),
    };

    tracing::debug!(backend = backend.name(), model = backend.model(), "backend ready");
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in BackendKind::ALL {
            assert_eq!(kind.as_str().parse::<BackendKind>().unwrap(), kind);
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = "gemini".parse::<BackendKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown backend: gemini");
        assert!(err.is_user_error());
        assert!("Anthropic".parse::<BackendKind>().is_err());
    }

    #[test]
    fn api_key_env_names() {
        assert_eq!(BackendKind::Anthropic.api_key_env(), "ANTHROPIC_API_KEY");
        assert_eq!(BackendKind::OpenAi.api_key_env(), "OPENAI_API_KEY");
        assert_eq!(BackendKind::OpenRouter.api_key_env(), "OPENROUTER_API_KEY");
    }

    #[test]
    fn build_uses_default_model_when_empty() {
        for kind in BackendKind::ALL {
            let backend = build(kind, BackendSettings::default()).unwrap();
            assert_eq!(backend.name(), kind.as_str());
            assert_eq!(backend.model(), kind.default_model());
        }
    }

    #[test]
    fn build_applies_model_override() {
        let settings = BackendSettings {
            api_key: "k".to_string(),
            model: "custom".to_string(),
            ..Default::default()
        };
        let backend = build(BackendKind::OpenRouter, settings).unwrap();
        assert_eq!(backend.model(), "custom");
    }

    #[test]
    fn backend_errors_classify() {
        assert!(BackendError::NoApiKey.is_user_error());
        assert!(BackendError::EmptyQuery.is_user_error());
        assert!(!BackendError::Timeout.is_user_error());
        assert!(!BackendError::EmptyResponse.is_user_error());
        assert!(!BackendError::Api {
            status: 500,
            message: String::new()
        }
        .is_user_error());
    }
}
