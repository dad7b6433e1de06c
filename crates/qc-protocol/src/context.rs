//! Context types for command-generation requests.

use serde::{Deserialize, Serialize};

/// Describes the shell the generated command will run in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShellContext {
    pub working_dir: String,
    pub shell: String,
    pub os: String,
}

impl Default for ShellContext {
    fn default() -> Self {
        Self {
            working_dir: "unknown".to_string(),
            shell: "unknown".to_string(),
            os: std::env::consts::OS.to_string(),
        }
    }
}

/// A complete request to a command-generation backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandRequest {
    /// Natural-language description of the desired command.
    pub query: String,
    /// Shell context, or `None` when context sharing is disabled.
    pub context: Option<ShellContext>,
    /// Per-request model override. Empty means the backend default.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model: String,
}

impl CommandRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            context: None,
            model: String::new(),
        }
    }

    pub fn with_context(mut self, context: ShellContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}
