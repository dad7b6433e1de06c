//! ANSI styling for stderr banners. Honors `NO_COLOR`.

use std::io::IsTerminal;

/// Colors used by qcmd's banners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Yellow,
    Green,
}

impl Color {
    fn code(self) -> &'static str {
        match self {
            Color::Red => "\x1b[31m",
            Color::Yellow => "\x1b[33m",
            Color::Green => "\x1b[32m",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    enabled: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self::for_stderr()
    }
}

impl Style {
    /// Colors on when stderr is a terminal and `NO_COLOR` is unset.
    pub fn for_stderr() -> Self {
        Self {
            enabled: std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal(),
        }
    }

    pub fn force_enabled() -> Self {
        Self { enabled: true }
    }

    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Wrap `text` in bold plus `color`.
    pub fn paint(&self, color: Color, text: &str) -> String {
        if self.enabled {
            format!("\x1b[1m{}{text}\x1b[0m", color.code())
        } else {
            text.to_string()
        }
    }

    pub fn dim(&self, text: &str) -> String {
        if self.enabled {
            format!("\x1b[2m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}
