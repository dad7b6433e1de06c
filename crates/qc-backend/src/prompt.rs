//! System prompt shared by every provider.

use qc_protocol::ShellContext;

const BASE_PROMPT: &str = r#"You are a shell command generator. Your ONLY job is to output a valid shell command.

Rules:
1. Output ONLY the raw shell command - no explanation, no markdown, no code fences
2. Do not include any text before or after the command
3. If multiple commands are needed, chain them with && or ;
4. For complex commands, use proper line continuation with backslashes
5. If the request is unclear or impossible, output exactly: echo "QCMD_ERROR: <brief reason>"
6. If the request would require dangerous operations, still provide the command (the tool handles safety)
7. Escape shell metacharacters properly (e.g., use \; not ; in find -exec, escape $ in strings)"#;

/// Build the system prompt, appending the context block when available.
pub fn system_prompt(context: Option<&ShellContext>) -> String {
    match context {
        None => BASE_PROMPT.to_string(),
        Some(ctx) => format!(
            "{BASE_PROMPT}

Context provided:
- Working directory: {}
- Shell: {}
- OS: {}",
            ctx.working_dir, ctx.shell, ctx.os
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_without_context() {
        let prompt = system_prompt(None);
        assert!(prompt.starts_with("You are a shell command generator."));
        assert!(prompt.contains("QCMD_ERROR: <brief reason>"));
        assert!(!prompt.contains("Context provided:"));
    }

    #[test]
    fn prompt_with_context() {
        let ctx = ShellContext {
            working_dir: "/home/user/project".to_string(),
            shell: "zsh".to_string(),
            os: "darwin".to_string(),
        };
        let prompt = system_prompt(Some(&ctx));
        assert!(prompt.starts_with(BASE_PROMPT));
        assert!(prompt.contains("- Working directory: /home/user/project"));
        assert!(prompt.contains("- Shell: zsh"));
        assert!(prompt.ends_with("- OS: darwin"));
    }
}
