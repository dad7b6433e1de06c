//! Shell-wrapper extraction rules.
//!
//! Each rule has exactly one capture group holding the wrapped command.

use std::sync::LazyLock;

use regex::Regex;

/// Recognizes one wrapper construct and yields its inner command.
#[derive(Debug)]
pub struct WrapperRule {
    pub name: &'static str,
    pub regex: Regex,
}

impl WrapperRule {
    fn new(name: &'static str, source: &str) -> Self {
        let regex = Regex::new(source).expect("static wrapper must compile");
        debug_assert_eq!(regex.captures_len(), 2, "wrapper needs one capture group");
        Self { name, regex }
    }

    /// Inner command wrapped by this construct, trimmed. `None` when the rule
    /// does not match or the capture is blank.
    pub fn extract<'a>(&self, cmd: &'a str) -> Option<&'a str> {
        let inner = self.regex.captures(cmd)?.get(1)?.as_str().trim();
        if inner.is_empty() {
            None
        } else {
            Some(inner)
        }
    }
}

static WRAPPER_RULES: LazyLock<Vec<WrapperRule>> = LazyLock::new(|| {
    vec![
        WrapperRule::new("sudo", r"sudo\s+(.+)"),
        WrapperRule::new("sh -c", r#"sh\s+-c\s+["'](.+)["']"#),
        WrapperRule::new("bash -c", r#"bash\s+-c\s+["'](.+)["']"#),
        WrapperRule::new("zsh -c", r#"zsh\s+-c\s+["'](.+)["']"#),
        WrapperRule::new("eval", r#"eval\s+["']?(.+?)["']?$"#),
    ]
});

/// The ordered wrapper registry.
pub fn wrapper_rules() -> &'static [WrapperRule] {
    &WRAPPER_RULES
}
