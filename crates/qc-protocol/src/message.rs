//! Response types returned by command-generation backends.

use serde::{Deserialize, Serialize};

/// Result of one command-generation call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandResponse {
    /// Raw command text as returned by the model. May still carry markdown.
    pub command: String,
    /// Model that served the request, as reported by the provider.
    pub model: String,
    /// Input plus output tokens. Zero when the provider does not report usage.
    pub tokens_used: u32,
}

impl CommandResponse {
    pub fn new(command: impl Into<String>, model: impl Into<String>, tokens_used: u32) -> Self {
        Self {
            command: command.into(),
            model: model.into(),
            tokens_used,
        }
    }
}
