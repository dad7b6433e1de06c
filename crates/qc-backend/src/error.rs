use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no API key configured")]
    NoApiKey,
    #[error("empty query")]
    EmptyQuery,
    #[error("empty response from LLM")]
    EmptyResponse,
    #[error("unknown backend: {0}")]
    UnknownBackend(String),
    #[error("request timed out")]
    Timeout,
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Http(e)
        }
    }
}

impl BackendError {
    /// Whether the failure came from the caller's input or configuration
    /// rather than the provider or transport.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            BackendError::NoApiKey | BackendError::EmptyQuery | BackendError::UnknownBackend(_)
        )
    }
}
