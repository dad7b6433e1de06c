//! qc-protocol: Shared types passed between the qcmd CLI and its LLM backends.
//!
//! The backend crate only sees these types, never the CLI configuration.

pub mod context;
pub mod message;

pub use context::{CommandRequest, ShellContext};
pub use message::CommandResponse;
