//! Canonicalization applied before pattern matching.

use std::sync::LazyLock;

use regex::Regex;

static REPEATED_SLASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/{2,}").expect("static regex must compile"));

/// Normalize a command for matching.
///
/// Trims the ends, collapses every whitespace run to a single space and
/// every run of `/` to a single `/`. Exact spacing inside quoted arguments is
/// lost; the result is only ever used for matching.
///
/// Idempotent: `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(cmd: &str) -> String {
    let collapsed = cmd.split_whitespace().collect::<Vec<_>>().join(" ");
    REPEATED_SLASHES.replace_all(&collapsed, "/").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn normalize_cases() {
        let cases = [
            ("trim leading whitespace", "  ls -la", "ls -la"),
            ("trim trailing whitespace", "ls -la  ", "ls -la"),
            ("collapse spaces", "rm   -rf   /tmp", "rm -rf /tmp"),
            ("double slashes", "ls //home//user", "ls /home/user"),
            ("tab becomes space", "ls\t-la", "ls -la"),
            ("newline becomes space", "ls\n-la", "ls -la"),
            (
                "combined",
                "  rm   -rf   //home//user  ",
                "rm -rf /home/user",
            ),
            ("slash run", "rm -rf ////", "rm -rf /"),
            ("empty", "", ""),
            ("only whitespace", " \t\n ", ""),
        ];

        for (name, input, expected) in cases {
            assert_eq!(normalize(input), expected, "case: {name}");
        }
    }

    #[test]
    fn normalize_keeps_single_slashes() {
        assert_eq!(normalize("/usr/local/bin"), "/usr/local/bin");
        assert_eq!(normalize("echo /"), "echo /");
    }

    #[test]
    fn normalize_collapses_url_scheme() {
        // Heuristic, not shell-aware: URLs lose their double slash too.
        assert_eq!(
            normalize("curl https://example.com"),
            "curl https:/example.com"
        );
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in "\\PC*") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn normalize_is_idempotent_on_shell_like_input(s in "[ \t\n/a-z~*$'\"-]{0,64}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn normalize_output_has_no_runs(s in "[ \t/a-z]{0,64}") {
            let out = normalize(&s);
            prop_assert!(!out.contains("  "));
            prop_assert!(!out.contains("//"));
            prop_assert_eq!(out.trim(), out.as_str());
        }
    }
}
