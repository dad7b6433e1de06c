//! Routes the final command to stdout or the clipboard.
//!
//! In `zle` mode stdout carries exactly the command bytes, with no trailing
//! newline, because the shell wrapper captures it verbatim and decides what
//! to do from the exit code.

use std::fmt;
use std::io::{self, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::str::FromStr;

use thiserror::Error;

use crate::style::{Color, Style};

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("no clipboard tool available")]
    NoClipboard,
    #[error("unsupported operating system for clipboard: {0}")]
    UnsupportedOs(&'static str),
    #[error("invalid output mode: {0}")]
    InvalidMode(String),
    #[error("clipboard tool {tool} failed: {reason}")]
    ClipboardFailed { tool: &'static str, reason: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Raw command on stdout for the shell wrapper.
    Zle,
    Clipboard,
    Print,
    /// Clipboard when possible, otherwise print.
    Auto,
}

impl OutputMode {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputMode::Zle => "zle",
            OutputMode::Clipboard => "clipboard",
            OutputMode::Print => "print",
            OutputMode::Auto => "auto",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputMode {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zle" => Ok(OutputMode::Zle),
            "clipboard" => Ok(OutputMode::Clipboard),
            "print" => Ok(OutputMode::Print),
            "auto" => Ok(OutputMode::Auto),
            other => Err(OutputError::InvalidMode(other.to_string())),
        }
    }
}

// --- Clipboard ---

/// Destination for clipboard copies.
pub trait Clipboard {
    fn is_available(&self) -> bool;
    fn copy(&self, text: &str) -> Result<(), OutputError>;
}

/// Clipboard backed by the platform's command-line tools.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

/// (program, args) candidates for the current OS, in preference order.
fn clipboard_candidates(os: &str) -> &'static [(&'static str, &'static [&'static str])] {
    match os {
        "macos" => &[("pbcopy", &[])],
        "linux" | "freebsd" | "openbsd" | "netbsd" => &[
            ("wl-copy", &[]),
            ("xclip", &["-selection", "clipboard"]),
            ("xsel", &["--clipboard", "--input"]),
        ],
        _ => &[],
    }
}

impl SystemClipboard {
    fn tool(&self) -> Result<(&'static str, &'static [&'static str]), OutputError> {
        let os = std::env::consts::OS;
        let candidates = clipboard_candidates(os);
        if candidates.is_empty() {
            return Err(OutputError::UnsupportedOs(os));
        }
        candidates
            .iter()
            .copied()
            .find(|(program, _)| which::which(program).is_ok())
            .ok_or(OutputError::NoClipboard)
    }
}

impl Clipboard for SystemClipboard {
    fn is_available(&self) -> bool {
        self.tool().is_ok()
    }

    fn copy(&self, text: &str) -> Result<(), OutputError> {
        let (program, args) = self.tool()?;
        let mut command = Command::new(program);
        command.args(args);

        let status = pipe_to(command, text)?;
        if status.success() {
            Ok(())
        } else {
            Err(OutputError::ClipboardFailed {
                tool: program,
                reason: status.to_string(),
            })
        }
    }
}

/// Feed `text` to the child's stdin and wait for it. The child is reaped on
/// every path, including a failed write.
fn pipe_to(mut command: Command, text: &str) -> io::Result<ExitStatus> {
    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        if let Err(e) = stdin.write_all(text.as_bytes()) {
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }
    }

    child.wait()
}

// --- Router ---

const COPIED: &str = "Command copied to clipboard.";

/// Writes the command according to the output mode. Writers and clipboard
/// are injected so the routing can be exercised in tests.
pub struct Router<'a> {
    stdout: &'a mut dyn Write,
    stderr: &'a mut dyn Write,
    clipboard: &'a dyn Clipboard,
    style: Style,
}

impl<'a> Router<'a> {
    pub fn new(
        stdout: &'a mut dyn Write,
        stderr: &'a mut dyn Write,
        clipboard: &'a dyn Clipboard,
    ) -> Self {
        Self {
            stdout,
            stderr,
            clipboard,
            style: Style::disabled(),
        }
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn style(&self) -> Style {
        self.style
    }

    /// Stream for banners and diagnostics.
    pub fn stderr(&mut self) -> &mut dyn Write {
        &mut *self.stderr
    }

    /// Deliver `cmd`. Outside `zle` mode a dangerous command is preceded by a
    /// warning on stderr.
    pub fn emit(
        &mut self,
        cmd: &str,
        mode: OutputMode,
        dangerous: bool,
    ) -> Result<(), OutputError> {
        if dangerous && mode != OutputMode::Zle {
            writeln!(self.stderr)?;
            let header = self.style.paint(
                Color::Red,
                "WARNING: This command has been flagged as potentially dangerous.",
            );
            writeln!(self.stderr, "{header}")?;
            writeln!(self.stderr, "Review carefully before executing.")?;
            writeln!(self.stderr)?;
        }

        match mode {
            OutputMode::Zle => {
                write!(self.stdout, "{cmd}")?;
                self.stdout.flush()?;
            }
            OutputMode::Print => self.print(cmd)?,
            OutputMode::Clipboard => {
                self.clipboard.copy(cmd)?;
                self.confirm_copy()?;
            }
            OutputMode::Auto => {
                if self.clipboard.is_available() {
                    match self.clipboard.copy(cmd) {
                        Ok(()) => self.confirm_copy()?,
                        Err(e) => {
                            tracing::debug!("clipboard copy failed, printing instead: {e}");
                            self.print(cmd)?;
                        }
                    }
                } else {
                    self.print(cmd)?;
                }
            }
        }
        Ok(())
    }

    fn confirm_copy(&mut self) -> io::Result<()> {
        writeln!(self.stderr, "{}", self.style.paint(Color::Green, COPIED))
    }

    fn print(&mut self, cmd: &str) -> io::Result<()> {
        writeln!(self.stdout, "{cmd}")?;
        self.stdout.flush()
    }
}
