//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

const AFTER_HELP: &str = "Input precedence (highest to lowest):
  1. --query-file (if provided)
  2. --query (if provided)
  3. Interactive editor";

/// Natural language to shell command.
#[derive(Debug, Parser)]
#[command(name = "qcmd", version, after_help = AFTER_HELP)]
pub struct Cli {
    /// Read the query from a file (`#` lines are ignored)
    #[arg(long, value_name = "PATH")]
    pub query_file: Option<PathBuf>,

    /// Query text
    #[arg(long, value_name = "TEXT")]
    pub query: Option<String>,

    /// Override backend (anthropic|openai|openrouter)
    #[arg(long, value_name = "NAME")]
    pub backend: Option<String>,

    /// Override model
    #[arg(long, value_name = "NAME")]
    pub model: Option<String>,

    /// Output mode: zle|clipboard|print|auto
    #[arg(long, value_name = "MODE")]
    pub output: Option<String>,

    /// Disable safety checks
    #[arg(long)]
    pub no_safety: bool,

    /// Config file path
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Show current configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
    /// List available backends
    Backends,
    /// Classify a command without contacting a backend
    Check {
        /// Command to classify; multiple words are joined with spaces
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum ConfigAction {
    /// Create default config file
    Init,
}

impl Cli {
    /// Empty flag values count as absent.
    pub fn query_text(&self) -> Option<&str> {
        self.query.as_deref().filter(|q| !q.is_empty())
    }

    pub fn backend_name(&self) -> Option<&str> {
        self.backend.as_deref().filter(|b| !b.is_empty())
    }

    pub fn model_name(&self) -> Option<&str> {
        self.model.as_deref().filter(|m| !m.is_empty())
    }

    pub fn output_mode(&self) -> Option<&str> {
        self.output.as_deref().filter(|o| !o.is_empty())
    }
}
