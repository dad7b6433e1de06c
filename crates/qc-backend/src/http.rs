//! Shared HTTP plumbing for the provider adapters.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::BackendError;

/// Build an HTTP client with connection limits. Request timeouts are applied
/// per call so one client can serve any configured deadline.
pub(crate) fn build_http_client() -> Result<Client, BackendError> {
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(2)
        .build()?;
    Ok(client)
}

/// Provider error envelope. Anthropic and the OpenAI-compatible APIs both
/// report `{"error": {"message": ...}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Send a prepared request and decode a successful JSON body.
///
/// Non-2xx statuses become `BackendError::Api`, preferring the provider's
/// own error message over the raw body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    timeout: Duration,
) -> Result<T, BackendError> {
    let response = request.timeout(timeout).send().await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(BackendError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_str(&body)?)
}
