//! Two-phase command classification with bounded wrapper unwrapping.

use crate::normalize::normalize;
use crate::patterns::{caution_patterns, danger_patterns, first_match, Pattern};
use crate::severity::{Category, Severity};
use crate::wrappers::{wrapper_rules, WrapperRule};

/// Wrapper nesting beyond this depth is not inspected.
pub const MAX_WRAPPER_DEPTH: usize = 5;

const VIA_WRAPPER: &str = " (via wrapper)";

/// Outcome of classifying one command.
///
/// A `Safe` result always carries empty evidence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub severity: Severity,
    /// Source of the matching regex, suffixed with `(via wrapper)` when the
    /// match came from an unwrapped inner command.
    pub pattern: String,
    pub description: String,
    pub category: Option<Category>,
}

impl Classification {
    pub fn safe() -> Self {
        Self::default()
    }

    fn from_pattern(pattern: &Pattern) -> Self {
        Self {
            severity: pattern.severity,
            pattern: pattern.source().to_string(),
            description: pattern.description.to_string(),
            category: Some(pattern.category),
        }
    }

    pub fn is_safe(&self) -> bool {
        self.severity == Severity::Safe
    }

    pub fn is_danger(&self) -> bool {
        self.severity == Severity::Danger
    }

    /// Category name, or `""` for a safe result.
    pub fn category_str(&self) -> &'static str {
        self.category.map(|c| c.as_str()).unwrap_or("")
    }

    /// Whether the match was found inside a wrapper rather than at top level.
    pub fn via_wrapper(&self) -> bool {
        self.pattern.ends_with(VIA_WRAPPER)
    }
}

/// Classifies commands against a set of registries.
///
/// `Checker::new()` uses the built-in registries. The checker holds only
/// shared references, so it is `Copy` and safe to use from any thread.
#[derive(Debug, Clone, Copy)]
pub struct Checker<'a> {
    danger: &'a [Pattern],
    caution: &'a [Pattern],
    wrappers: &'a [WrapperRule],
}

impl Default for Checker<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl Checker<'static> {
    pub fn new() -> Self {
        Self {
            danger: danger_patterns(),
            caution: caution_patterns(),
            wrappers: wrapper_rules(),
        }
    }
}

impl<'a> Checker<'a> {
    /// Build a checker over custom registries.
    pub fn with_registries(
        danger: &'a [Pattern],
        caution: &'a [Pattern],
        wrappers: &'a [WrapperRule],
    ) -> Self {
        Self {
            danger,
            caution,
            wrappers,
        }
    }

    /// Classify a raw command string. Total over all inputs.
    pub fn check(&self, cmd: &str) -> Classification {
        let normalized = normalize(cmd);

        let direct = self.check_danger(&normalized);
        if direct.is_danger() {
            return direct;
        }

        let nested = self.check_nested(&normalized, 0);
        if nested.severity > direct.severity {
            return nested;
        }

        if direct.is_safe() {
            return self.check_caution(&normalized);
        }

        direct
    }

    fn check_danger(&self, cmd: &str) -> Classification {
        first_match(self.danger, cmd)
            .map(Classification::from_pattern)
            .unwrap_or_default()
    }

    fn check_caution(&self, cmd: &str) -> Classification {
        first_match(self.caution, cmd)
            .map(Classification::from_pattern)
            .unwrap_or_default()
    }

    /// Unwrap every matching wrapper and classify the inner command, keeping
    /// the highest result. Inner Danger short-circuits.
    fn check_nested(&self, cmd: &str, depth: usize) -> Classification {
        if depth >= MAX_WRAPPER_DEPTH {
            return Classification::safe();
        }

        let mut highest = Classification::safe();

        for wrapper in self.wrappers {
            let Some(inner) = wrapper.extract(cmd) else {
                continue;
            };
            let inner = normalize(inner);

            let mut inner_result = self.check_danger(&inner);
            if inner_result.is_danger() {
                inner_result.pattern.push_str(VIA_WRAPPER);
                return inner_result;
            }

            let nested = self.check_nested(&inner, depth + 1);
            if nested.severity > highest.severity {
                highest = nested;
            }
            if inner_result.severity > highest.severity {
                highest = inner_result;
            }
        }

        highest
    }
}

/// Classify `cmd` with the built-in registries.
pub fn check(cmd: &str) -> Classification {
    Checker::new().check(cmd)
}
