//! Well-known labels and annotations, and label selectors over them.
//!
//! Selectors follow the platform's set-based semantics: every requirement must
//! hold for the selector to match, and the `>` operator only matches labels
//! whose value parses as an integer.

use std::collections::BTreeMap;
use std::fmt;

/// Label carried by every object (and pod) belonging to an Integration.
pub const INTEGRATION_LABEL: &str = "intop.dev/integration";

/// Numeric priority of an IntegrationKit. Absent means `0`.
pub const KIT_PRIORITY_LABEL: &str = "intop.dev/kit.priority";

/// Origin of an IntegrationKit, see the `KIT_TYPE_*` values.
pub const KIT_TYPE_LABEL: &str = "intop.dev/kit.type";
pub const KIT_TYPE_PLATFORM: &str = "platform";
pub const KIT_TYPE_EXTERNAL: &str = "external";
pub const KIT_TYPE_SYNTHETIC: &str = "synthetic";

pub const RUNTIME_VERSION_LABEL: &str = "intop.dev/runtime.version";
pub const RUNTIME_PROVIDER_LABEL: &str = "intop.dev/runtime.provider";

/// Identity of the operator instance that owns a resource.
pub const OPERATOR_ID_ANNOTATION: &str = "intop.dev/operator.id";
pub const INTEGRATION_PROFILE_ANNOTATION: &str = "intop.dev/integration-profile";
pub const INTEGRATION_PROFILE_NAMESPACE_ANNOTATION: &str =
    "intop.dev/integration-profile.namespace";

/// Default priority of a kit that carries no priority label.
pub const DEFAULT_KIT_PRIORITY: &str = "0";

/// A single label requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Equals { key: String, value: String },
    In { key: String, values: Vec<String> },
    GreaterThan { key: String, value: i64 },
    Exists { key: String },
}

impl Requirement {
    pub fn key(&self) -> &str {
        match self {
            Self::Equals { key, .. }
            | Self::In { key, .. }
            | Self::GreaterThan { key, .. }
            | Self::Exists { key } => key,
        }
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        let Some(actual) = labels.get(self.key()) else {
            return false;
        };
        match self {
            Self::Equals { value, .. } => actual == value,
            Self::In { values, .. } => values.iter().any(|v| v == actual),
            Self::GreaterThan { value, .. } => actual
                .parse::<i64>()
                .map(|parsed| parsed > *value)
                .unwrap_or(false),
            Self::Exists { .. } => true,
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals { key, value } => write!(f, "{key}={value}"),
            Self::In { key, values } => write!(f, "{key} in ({})", values.join(",")),
            Self::GreaterThan { key, value } => write!(f, "{key}>{value}"),
            Self::Exists { key } => write!(f, "{key}"),
        }
    }
}

/// Conjunction of label requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.requirements.push(Requirement::Equals {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_in<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requirements.push(Requirement::In {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn with_greater_than(mut self, key: impl Into<String>, value: i64) -> Self {
        self.requirements.push(Requirement::GreaterThan {
            key: key.into(),
            value,
        });
        self
    }

    pub fn with_exists(mut self, key: impl Into<String>) -> Self {
        self.requirements.push(Requirement::Exists { key: key.into() });
        self
    }

    /// Appends all requirements of `other`.
    pub fn merge(mut self, other: LabelSelector) -> Self {
        self.requirements.extend(other.requirements);
        self
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// An empty selector matches everything, including unlabelled objects.
    pub fn matches(&self, labels: Option<&BTreeMap<String, String>>) -> bool {
        if self.requirements.is_empty() {
            return true;
        }
        let empty = BTreeMap::new();
        let labels = labels.unwrap_or(&empty);
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.requirements.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_equals_and_in() {
        let selector = LabelSelector::new()
            .with_label(INTEGRATION_LABEL, "hello")
            .with_in(KIT_TYPE_LABEL, [KIT_TYPE_PLATFORM, KIT_TYPE_EXTERNAL]);

        let matching = labels(&[(INTEGRATION_LABEL, "hello"), (KIT_TYPE_LABEL, "external")]);
        let wrong_type = labels(&[(INTEGRATION_LABEL, "hello"), (KIT_TYPE_LABEL, "synthetic")]);

        assert!(selector.matches(Some(&matching)));
        assert!(!selector.matches(Some(&wrong_type)));
        assert!(!selector.matches(None));
    }

    #[test]
    fn test_greater_than_requires_numeric_label() {
        let selector = LabelSelector::new().with_greater_than(KIT_PRIORITY_LABEL, 3);

        assert!(selector.matches(Some(&labels(&[(KIT_PRIORITY_LABEL, "5")]))));
        assert!(!selector.matches(Some(&labels(&[(KIT_PRIORITY_LABEL, "3")]))));
        assert!(!selector.matches(Some(&labels(&[(KIT_PRIORITY_LABEL, "high")]))));
        assert!(!selector.matches(Some(&labels(&[]))));
    }

    #[test]
    fn test_empty_selector_matches_everything() {
        assert!(LabelSelector::new().matches(None));
    }

    #[test]
    fn test_display() {
        let selector = LabelSelector::new()
            .with_label("a", "1")
            .with_in("b", ["x", "y"])
            .with_greater_than("c", 2)
            .with_exists("d");
        assert_eq!(selector.to_string(), "a=1,b in (x,y),c>2,d");
    }
}
