//! qc-safety: Deterministic safety classification for generated shell commands.
//!
//! A command is normalized, matched against ordered Danger and Caution
//! registries, and unwrapped through `sudo`/`sh -c`/`eval` style wrappers so
//! that nested destructive commands are still caught.
//!
//! Everything here is pure: no I/O, no mutable global state. The registries
//! are compiled once per process and shared read-only.

pub mod checker;
pub mod normalize;
pub mod patterns;
pub mod severity;
pub mod wrappers;

pub use checker::{check, Checker, Classification, MAX_WRAPPER_DEPTH};
pub use normalize::normalize;
pub use patterns::{caution_patterns, danger_patterns, Pattern};
pub use severity::{Category, Severity};
pub use wrappers::{wrapper_rules, WrapperRule};
