//! Cleanup of raw model output.
//!
//! Markdown wrapping and prompt prefixes are removed while the internal
//! structure of multi-line commands (continuations, heredocs) is kept.

use std::sync::LazyLock;

use regex::Regex;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[a-zA-Z0-9_-]*\n?(.*?)\n?```\s*$").expect("static regex")
});

static INLINE_BACKTICKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^`([^`]+)`$").expect("static regex"));

static DOLLAR_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\s+").expect("static regex"));

static ERROR_SENTINEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^echo\s+["']QCMD_ERROR:\s*(.+?)["']$"#).expect("static regex")
});

/// Strip markdown fences, whole-output backticks, surrounding blank lines and
/// a leading `$ ` prompt. Returns `""` when nothing but whitespace remains.
pub fn sanitize(raw: &str) -> String {
    let mut text = raw;

    if let Some(inner) = CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        text = inner.as_str();
    }

    if let Some(inner) = INLINE_BACKTICKS.captures(text.trim()).and_then(|c| c.get(1)) {
        text = inner.as_str();
    }

    let lines: Vec<&str> = text.split('\n').collect();
    let Some(first) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return String::new();
    };
    let last = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .unwrap_or(first);

    let mut kept: Vec<String> = lines[first..=last].iter().map(|l| l.to_string()).collect();

    kept[0] = DOLLAR_PREFIX
        .replace(&kept[0], "")
        .trim_start_matches([' ', '\t'])
        .to_string();
    let end = kept.len() - 1;
    kept[end] = kept[end].trim_end_matches([' ', '\t']).to_string();

    kept.join("\n")
}

/// If `cmd` is the model's refusal sentinel (`echo "QCMD_ERROR: ..."`),
/// return the trimmed message.
pub fn check_error_sentinel(cmd: &str) -> Option<String> {
    ERROR_SENTINEL
        .captures(cmd.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}
