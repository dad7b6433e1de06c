//! Top-level error type and the process exit-code convention.

use std::io;
use std::path::PathBuf;

use qc_backend::{BackendError, BackendKind};
use thiserror::Error;

use crate::config::ConfigError;
use crate::editor::EditorError;
use crate::output::OutputError;

pub const EXIT_SUCCESS: i32 = 0;
/// Bad flags, bad input, invalid config, missing API key, LLM refusal.
pub const EXIT_USER_ERROR: i32 = 1;
/// Config load, transport, timeout, output failures.
pub const EXIT_SYSTEM_ERROR: i32 = 2;
/// A dangerous command was produced and flagged.
pub const EXIT_DANGER_BLOCKED: i32 = 3;

/// Longest accepted query, in bytes.
pub const MAX_QUERY_LENGTH: usize = 10_000;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{}{}", config_context(.0), .0)]
    Config(#[from] ConfigError),
    #[error("invalid output mode: {0}")]
    InvalidOutputMode(String),
    #[error("unknown backend: {0} (valid: anthropic, openai, openrouter)")]
    UnknownBackend(String),
    #[error("reading query file {}: {source}", .path.display())]
    QueryFile { path: PathBuf, source: io::Error },
    #[error("getting input from editor: {0}")]
    Editor(#[from] EditorError),
    #[error("empty query")]
    EmptyQuery,
    #[error("invalid input: contains null bytes")]
    NulBytes,
    #[error("query too long (max {} bytes)", MAX_QUERY_LENGTH)]
    QueryTooLong,
    #[error(
        "no API key configured for backend \"{backend}\"\n  Set {} environment variable or add api_key to config",
        .backend.api_key_env()
    )]
    NoApiKey { backend: BackendKind },
    #[error("request timed out")]
    Timeout,
    #[error("API error: {0}")]
    Backend(BackendError),
    #[error("LLM could not generate command: {0}")]
    LlmRefused(String),
    #[error("output error: {0}")]
    Output(#[from] OutputError),
    #[error("failed to create async runtime: {0}")]
    Runtime(io::Error),
}

fn config_context(err: &ConfigError) -> &'static str {
    match err {
        ConfigError::Read { .. } | ConfigError::Parse { .. } => "failed to load config: ",
        ConfigError::InvalidBackend(_)
        | ConfigError::InvalidOutputMode(_)
        | ConfigError::NonPositiveTimeout
        | ConfigError::NonPositiveMaxTokens => "invalid config: ",
        ConfigError::AlreadyExists(_) | ConfigError::NoConfigDir | ConfigError::Write { .. } => "",
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Timeout => AppError::Timeout,
            BackendError::UnknownBackend(name) => AppError::UnknownBackend(name),
            other => AppError::Backend(other),
        }
    }
}

impl AppError {
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(e) if e.is_user_error() => EXIT_USER_ERROR,
            AppError::Config(_) => EXIT_SYSTEM_ERROR,
            AppError::InvalidOutputMode(_)
            | AppError::UnknownBackend(_)
            | AppError::QueryFile { .. }
            | AppError::Editor(_)
            | AppError::EmptyQuery
            | AppError::NulBytes
            | AppError::QueryTooLong
            | AppError::NoApiKey { .. }
            | AppError::LlmRefused(_) => EXIT_USER_ERROR,
            AppError::Backend(e) if e.is_user_error() => EXIT_USER_ERROR,
            AppError::Timeout
            | AppError::Backend(_)
            | AppError::Output(_)
            | AppError::Runtime(_) => EXIT_SYSTEM_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn exit_codes() {
        let cases: Vec<(AppError, i32)> = vec![
            (AppError::EmptyQuery, EXIT_USER_ERROR),
            (AppError::QueryTooLong, EXIT_USER_ERROR),
            (AppError::LlmRefused("nope".into()), EXIT_USER_ERROR),
            (
                AppError::NoApiKey {
                    backend: BackendKind::OpenAi,
                },
                EXIT_USER_ERROR,
            ),
            (
                AppError::Config(ConfigError::NonPositiveTimeout),
                EXIT_USER_ERROR,
            ),
            (AppError::Config(ConfigError::NoConfigDir), EXIT_SYSTEM_ERROR),
            (AppError::Timeout, EXIT_SYSTEM_ERROR),
            (
                AppError::Backend(BackendError::Api {
                    status: 500,
                    message: "boom".into(),
                }),
                EXIT_SYSTEM_ERROR,
            ),
            (AppError::Backend(BackendError::EmptyQuery), EXIT_USER_ERROR),
            (AppError::Output(OutputError::NoClipboard), EXIT_SYSTEM_ERROR),
        ];
        for (err, code) in cases {
            assert_eq!(err.exit_code(), code, "{err}");
        }
    }

    #[test]
    fn backend_errors_are_classified_on_conversion() {
        assert!(matches!(
            AppError::from(BackendError::Timeout),
            AppError::Timeout
        ));
        assert!(matches!(
            AppError::from(BackendError::UnknownBackend("x".into())),
            AppError::UnknownBackend(name) if name == "x"
        ));
    }

    #[test]
    fn messages() {
        assert_eq!(
            AppError::NoApiKey {
                backend: BackendKind::Anthropic
            }
            .to_string(),
            "no API key configured for backend \"anthropic\"\n  \
             Set ANTHROPIC_API_KEY environment variable or add api_key to config"
        );
        assert_eq!(
            AppError::Config(ConfigError::NonPositiveMaxTokens).to_string(),
            "invalid config: max_tokens must be positive"
        );
        assert_eq!(
            AppError::Config(ConfigError::AlreadyExists(PathBuf::from("/tmp/qcmd/config.toml")))
                .to_string(),
            "config file already exists: /tmp/qcmd/config.toml"
        );
        let err: AppError = ConfigError::NoConfigDir.into();
        assert!(err.to_string().starts_with("cannot determine config directory"));
        assert_eq!(
            AppError::QueryTooLong.to_string(),
            "query too long (max 10000 bytes)"
        );
        assert_eq!(
            AppError::LlmRefused("ambiguous request".into()).to_string(),
            "LLM could not generate command: ambiguous request"
        );
    }
}
