//! qc-core: the `qcmd` application.
//!
//! Turns a natural-language query into a single shell command: reads the
//! query, asks the configured backend, cleans up the reply, runs it through
//! the safety classifier and routes it to stdout or the clipboard. Exposed
//! as a library for integration testing.

pub mod app;
pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod logging;
pub mod output;
pub mod sanitize;
pub mod shellctx;
pub mod style;

pub use app::{generate, run, Outcome, Settings};
pub use cli::Cli;
pub use config::Config;
pub use error::AppError;
pub use output::{Clipboard, OutputMode, Router};
