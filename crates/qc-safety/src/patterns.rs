//! Danger and Caution pattern registries.
//!
//! Both registries are flat, ordered tables. Order decides which rule is
//! reported when several match; severity comparisons never depend on it.
//!
//! Danger rules are anchored to root, home or block-device targets, never
//! to a bare command name, so `rm file.txt` or `rm -rf ./build` stay out of
//! the Danger set. Caution rules are deliberately broad.

use std::sync::LazyLock;

use regex::Regex;

use crate::severity::{Category, Severity};

/// An immutable classification rule.
#[derive(Debug)]
pub struct Pattern {
    pub regex: Regex,
    pub severity: Severity,
    pub description: &'static str,
    pub category: Category,
}

impl Pattern {
    fn new(
        source: &str,
        severity: Severity,
        description: &'static str,
        category: Category,
    ) -> Self {
        Self {
            regex: Regex::new(source).expect("static pattern must compile"),
            severity,
            description,
            category,
        }
    }

    fn danger(source: &str, description: &'static str, category: Category) -> Self {
        Self::new(source, Severity::Danger, description, category)
    }

    fn caution(source: &str, description: &'static str, category: Category) -> Self {
        Self::new(source, Severity::Caution, description, category)
    }

    /// Source text of the regex, reported as evidence.
    pub fn source(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, cmd: &str) -> bool {
        self.regex.is_match(cmd)
    }
}

static DANGER_PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    use Category::*;

    vec![
        // --- Filesystem destruction ---
        Pattern::danger(
            r"(?i)rm\s+(-[rf]+\s+)*(/|~|\$HOME)(\s|$)",
            "Recursive delete on root or home directory",
            Filesystem,
        ),
        Pattern::danger(
            r"rm\s+(-[rRf]+\s+)*/\*(\s|$)",
            "Delete everything in root directory",
            Filesystem,
        ),
        Pattern::danger(
            r"rm\s+-[rRf]*[rRf][rRf]*\s+\*(\s|$)",
            "Delete all files in current directory with force/recursive flags",
            Filesystem,
        ),
        // --- Block devices ---
        Pattern::danger(
            r"dd\s+.*of=/dev/[sh]d[a-z]+",
            "Direct disk write (dd to block device)",
            Filesystem,
        ),
        Pattern::danger(
            r"mkfs\.[a-z0-9]+\s+/dev/",
            "Filesystem format on a device",
            Filesystem,
        ),
        Pattern::danger(
            r">\s*/dev/[sh]d[a-z]",
            "Redirect output to disk device",
            Filesystem,
        ),
        // --- Resource exhaustion ---
        Pattern::danger(
            r":\s*\(\s*\)\s*\{[^}]*:\s*\|\s*:",
            "Fork bomb pattern detected",
            System,
        ),
        // --- Root permissions and ownership ---
        Pattern::danger(
            r"chmod\s+(-[rR]+\s+)*(000|777)\s+/(\s|$)",
            "Dangerous permission change on root filesystem",
            Filesystem,
        ),
        Pattern::danger(
            r"chown\s+(-[rR]+\s+)*.+\s+/(\s|$)",
            "Recursive ownership change on root filesystem",
            Filesystem,
        ),
        Pattern::danger(r"mv\s+/\s+", "Move root directory", Filesystem),
        Pattern::danger(
            r"cat\s+/dev/u?random\s*>\s*/dev/sd",
            "Write random data to disk device",
            Filesystem,
        ),
        // --- Authentication files ---
        Pattern::danger(
            r">\s*/etc/(passwd|shadow)",
            "Overwrite authentication files",
            System,
        ),
    ]
});

static CAUTION_PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    use Category::*;

    vec![
        Pattern::caution(r"sudo\s+", "Command requires elevated privileges", System),
        Pattern::caution(
            r"curl\s+.*\|\s*(ba)?sh",
            "Piping remote script directly to shell",
            Network,
        ),
        Pattern::caution(
            r"wget\s+.*\|\s*(ba)?sh",
            "Piping remote script directly to shell",
            Network,
        ),
        Pattern::caution(r"eval\s+", "Dynamic command execution with eval", System),
        Pattern::caution(
            r"rm\s+-[rRf]+\s+",
            "Recursive or forced file deletion",
            Filesystem,
        ),
        Pattern::caution(r"chmod\s+-[rR]+\s+", "Recursive permission change", Filesystem),
        Pattern::caution(r"chown\s+-[rR]+\s+", "Recursive ownership change", Filesystem),
        Pattern::caution(r"pkill\s+", "Kill processes by pattern", System),
        Pattern::caution(r"killall\s+", "Kill all processes by name", System),
    ]
});

/// Rules whose match blocks shell injection.
pub fn danger_patterns() -> &'static [Pattern] {
    &DANGER_PATTERNS
}

/// Rules whose match only warns.
pub fn caution_patterns() -> &'static [Pattern] {
    &CAUTION_PATTERNS
}

/// First pattern in `registry` matching `cmd`.
pub(crate) fn first_match<'a>(registry: &'a [Pattern], cmd: &str) -> Option<&'a Pattern> {
    registry.iter().find(|p| p.is_match(cmd))
}
