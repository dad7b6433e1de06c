//! Gathers the shell context sent alongside a query.

use std::path::Path;

use qc_protocol::ShellContext;

const UNKNOWN: &str = "unknown";

/// Working directory, shell name and OS of the current process. Never fails;
/// anything undeterminable is reported as `unknown`.
pub fn gather() -> ShellContext {
    ShellContext {
        working_dir: std::env::current_dir()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| UNKNOWN.to_string()),
        shell: shell_name(std::env::var("SHELL").ok().as_deref()),
        os: std::env::consts::OS.to_string(),
    }
}

/// Basename of a `$SHELL` value, e.g. `/usr/bin/zsh` -> `zsh`.
pub fn shell_name(shell_path: Option<&str>) -> String {
    match shell_path.map(str::trim).filter(|s| !s.is_empty()) {
        Some(path) => Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string()),
        None => UNKNOWN.to_string(),
    }
}
