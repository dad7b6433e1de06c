//! Query input through the user's `$EDITOR`.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, ExitStatus};

use thiserror::Error;

/// Template shown in the editor. Comment lines are dropped on read.
pub const INPUT_TEMPLATE: &str = "# Describe the shell command you need
# Lines starting with # are ignored
# Save and quit when done (:wq in vim)

";

pub const TEMP_FILE_PREFIX: &str = "qcmd-";

const FALLBACK_EDITOR: &str = "vi";

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("creating temp file: {0}")]
    TempFile(io::Error),
    #[error("writing template: {0}")]
    Template(io::Error),
    #[error("launching editor {editor}: {source}")]
    Launch { editor: String, source: io::Error },
    #[error("editor {editor} exited with {status}")]
    Failed { editor: String, status: ExitStatus },
    #[error("reading temp file: {0}")]
    Read(io::Error),
}

/// Opens the user's editor on a scratch file and returns what they wrote.
#[derive(Debug, Clone, Default)]
pub struct Editor {
    override_cmd: String,
}

impl Editor {
    /// `override_cmd` wins over `$VISUAL`/`$EDITOR` when non-empty.
    pub fn new(override_cmd: impl Into<String>) -> Self {
        Self {
            override_cmd: override_cmd.into(),
        }
    }

    /// Program and arguments that will be launched.
    pub fn command(&self) -> Vec<String> {
        editor_command(&self.override_cmd, |key| {
            std::env::var(key).ok().filter(|v| !v.is_empty())
        })
    }

    /// Blocks until the editor exits. The scratch file is private to the
    /// user and removed on every path, including errors.
    pub fn read_input(&self) -> Result<String, EditorError> {
        let mut file = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .suffix(".txt")
            .tempfile()
            .map_err(EditorError::TempFile)?;

        file.write_all(INPUT_TEMPLATE.as_bytes())
            .and_then(|_| file.flush())
            .map_err(EditorError::Template)?;
        restrict_permissions(file.path()).map_err(EditorError::Template)?;

        let parts = self.command();
        let editor = parts.join(" ");
        let (program, args) = parts
            .split_first()
            .map(|(p, a)| (p.clone(), a.to_vec()))
            .unwrap_or_else(|| (FALLBACK_EDITOR.to_string(), Vec::new()));

        tracing::debug!(%editor, path = %file.path().display(), "launching editor");

        let status = Command::new(&program)
            .args(&args)
            .arg(file.path())
            .status()
            .map_err(|source| EditorError::Launch {
                editor: editor.clone(),
                source,
            })?;

        if !status.success() {
            return Err(EditorError::Failed { editor, status });
        }

        let content = fs::read_to_string(file.path()).map_err(EditorError::Read)?;
        Ok(process_input(&content))
    }
}

/// Resolve the editor: override, `$VISUAL`, `$EDITOR`, then `vi`. The chosen
/// string is split on whitespace so values like `code --wait` work.
pub fn editor_command<F>(override_cmd: &str, env: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let chosen = if !override_cmd.trim().is_empty() {
        override_cmd.to_string()
    } else {
        env("VISUAL")
            .or_else(|| env("EDITOR"))
            .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
    };

    let parts: Vec<String> = chosen.split_whitespace().map(str::to_string).collect();
    if parts.is_empty() {
        vec![FALLBACK_EDITOR.to_string()]
    } else {
        parts
    }
}

/// Full path of the editor binary when it can be found on `PATH`.
pub fn resolve_editor_path(override_cmd: &str) -> PathBuf {
    let parts = Editor::new(override_cmd).command();
    let program = parts.first().map(String::as_str).unwrap_or(FALLBACK_EDITOR);
    which::which(program).unwrap_or_else(|_| PathBuf::from(program))
}

/// Drop `#` comment lines and blank lines, keep the rest (with indentation)
/// joined by newlines, and trim the result.
pub fn process_input(raw: &str) -> String {
    raw.lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(unix)]
fn restrict_permissions(path: &std::path::Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &std::path::Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn env_with(visual: Option<&str>, editor: Option<&str>) -> impl Fn(&str) -> Option<String> {
        let visual = visual.map(str::to_string);
        let editor = editor.map(str::to_string);
        move |key| match key {
            "VISUAL" => visual.clone(),
            "EDITOR" => editor.clone(),
            _ => None,
        }
    }

    #[test]
    fn editor_lookup_order() {
        assert_eq!(
            editor_command("nano", env_with(Some("code"), Some("vim"))),
            vec!["nano"]
        );
        assert_eq!(
            editor_command("", env_with(Some("code --wait"), Some("vim"))),
            vec!["code", "--wait"]
        );
        assert_eq!(editor_command("", env_with(None, Some("vim"))), vec!["vim"]);
        assert_eq!(editor_command("", env_with(None, None)), vec!["vi"]);
        assert_eq!(editor_command("   ", env_with(None, None)), vec!["vi"]);
    }

    #[test]
    fn resolve_editor_path_uses_program_only() {
        assert_eq!(
            resolve_editor_path("/opt/qcmd-missing/code --wait"),
            PathBuf::from("/opt/qcmd-missing/code")
        );
        if let Ok(sh) = which::which("sh") {
            assert_eq!(resolve_editor_path("sh -c true"), sh);
        }
    }

    #[test]
    fn process_input_drops_comments_and_blanks() {
        let raw = format!("{INPUT_TEMPLATE}find large files\n\n# note\n  over 100MB\n\n");
        assert_eq!(process_input(&raw), "find large files\n  over 100MB");
    }

    #[test]
    fn process_input_template_only_is_empty() {
        assert_eq!(process_input(INPUT_TEMPLATE), "");
        assert_eq!(process_input(""), "");
        assert_eq!(process_input("   \n\t\n"), "");
    }

    #[test]
    fn process_input_indented_comment_is_dropped() {
        assert_eq!(process_input("  # hidden\nlist files"), "list files");
    }

    #[test]
    fn template_is_all_comments() {
        assert!(INPUT_TEMPLATE
            .lines()
            .all(|l| l.is_empty() || l.starts_with('#')));
    }

    #[cfg(unix)]
    #[test]
    fn read_input_with_scripted_editor() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-editor.sh");
        fs::write(
            &script,
            "#!/bin/sh\nprintf 'show disk usage\\n' >> \"$1\"\n",
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let editor = Editor::new(script.to_string_lossy().to_string());
        assert_eq!(editor.read_input().unwrap(), "show disk usage");
    }

    #[cfg(unix)]
    #[test]
    fn failing_editor_is_error() {
        let editor = Editor::new("false");
        let err = editor.read_input().unwrap_err();
        assert!(matches!(err, EditorError::Failed { .. }), "{err}");
    }

    #[test]
    fn missing_editor_is_launch_error() {
        let editor = Editor::new("qcmd-no-such-editor-binary");
        let err = editor.read_input().unwrap_err();
        assert!(matches!(err, EditorError::Launch { .. }), "{err}");
    }
}
