//! Severity levels and pattern categories.

use std::fmt;

/// Severity of a classified command, ordered from least to most dangerous.
///
/// The derived ordering is what "keep the highest result" comparisons use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    #[default]
    Safe,
    Caution,
    Danger,
}

impl Severity {
    /// Machine-readable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Safe => "safe",
            Severity::Caution => "caution",
            Severity::Danger => "danger",
        }
    }

    /// Human-readable label for warning banners.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Safe => "Safe",
            Severity::Caution => "Caution",
            Severity::Danger => "DANGER",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad area a pattern protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Filesystem,
    Network,
    System,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Filesystem => "filesystem",
            Category::Network => "network",
            Category::System => "system",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(Severity::Safe < Severity::Caution);
        assert!(Severity::Caution < Severity::Danger);
        assert!(Severity::Safe < Severity::Danger);
    }

    #[test]
    fn severity_max() {
        let levels = vec![Severity::Caution, Severity::Danger, Severity::Safe];
        assert_eq!(levels.into_iter().max(), Some(Severity::Danger));
    }

    #[test]
    fn severity_default_is_safe() {
        assert_eq!(Severity::default(), Severity::Safe);
    }

    #[test]
    fn severity_display() {
        assert_eq!(Severity::Safe.to_string(), "safe");
        assert_eq!(Severity::Caution.to_string(), "caution");
        assert_eq!(Severity::Danger.to_string(), "danger");
    }

    #[test]
    fn severity_labels() {
        assert_eq!(Severity::Caution.label(), "Caution");
        assert_eq!(Severity::Danger.label(), "DANGER");
    }

    #[test]
    fn category_display() {
        assert_eq!(Category::Filesystem.to_string(), "filesystem");
        assert_eq!(Category::Network.to_string(), "network");
        assert_eq!(Category::System.to_string(), "system");
    }
}
