//! Errors raised while assembling an environment or applying traits.

use intop_client::ClientError;
use intop_core::CoreError;

/// Errors that can occur in the trait pipeline.
#[derive(Debug, thiserror::Error)]
pub enum TraitError {
    /// A trait refused the Integration's configuration.
    #[error("trait {id}: {message}")]
    Failed {
        /// Identifier of the failing trait.
        id: String,
        /// Why the trait failed.
        message: String,
    },

    /// A trait configuration entry could not be parsed.
    #[error("trait {id}: {source}")]
    InvalidConfiguration {
        /// Identifier of the trait owning the entry.
        id: String,
        #[source]
        source: CoreError,
    },

    /// A trait failed while the catalog was applying it.
    #[error("error applying trait {id}: {source}")]
    Apply {
        /// Identifier of the failing trait.
        id: String,
        #[source]
        source: Box<TraitError>,
    },

    /// Two traits of a catalog share an identifier.
    #[error("duplicate trait {0}")]
    DuplicateTrait(String),

    /// A trait depends on an identifier the catalog does not contain.
    #[error("trait {id} depends on unknown trait {dependency}")]
    UnknownDependency {
        /// Identifier of the dependent trait.
        id: String,
        /// Missing dependency.
        dependency: String,
    },

    /// Trait dependencies form a cycle.
    #[error("trait dependency cycle between {}", ids.join(", "))]
    Cycle {
        /// Traits left unordered.
        ids: Vec<String>,
    },

    /// No integration platform is registered for the namespace.
    #[error("no integration platform available in namespace {namespace}")]
    MissingPlatform {
        /// Namespace of the Integration.
        namespace: String,
    },

    /// The Integration does not reference a kit that can be resolved.
    #[error("unable to find integration kit for integration {integration}")]
    MissingKit {
        /// Name of the Integration.
        integration: String,
    },

    /// Platform API access failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A generated object could not be (de)serialized.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TraitError {
    /// Creates a new `Failed` error.
    #[must_use]
    pub fn failed(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Creates a new `InvalidConfiguration` error.
    #[must_use]
    pub fn invalid_configuration(id: impl Into<String>, source: CoreError) -> Self {
        Self::InvalidConfiguration {
            id: id.into(),
            source,
        }
    }

    /// Creates a new `MissingPlatform` error.
    #[must_use]
    pub fn missing_platform(namespace: impl Into<String>) -> Self {
        Self::MissingPlatform {
            namespace: namespace.into(),
        }
    }

    /// Creates a new `MissingKit` error.
    #[must_use]
    pub fn missing_kit(integration: impl Into<String>) -> Self {
        Self::MissingKit {
            integration: integration.into(),
        }
    }

    /// Returns `true` if the error was raised by the catalog's shape rather than an Integration.
    #[must_use]
    pub fn is_catalog_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateTrait(_) | Self::UnknownDependency { .. } | Self::Cycle { .. }
        )
    }

    /// Returns `true` if the error came from the platform API.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Client(_) => true,
            Self::Apply { source, .. } => source.is_client_error(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TraitError::Apply {
            id: "cron".into(),
            source: Box::new(TraitError::failed("cron", "schedule is required")),
        };
        assert_eq!(
            err.to_string(),
            "error applying trait cron: trait cron: schedule is required"
        );

        let err = TraitError::Cycle {
            ids: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "trait dependency cycle between a, b");
        assert!(err.is_catalog_error());
    }

    #[test]
    fn test_client_error_is_detected_through_apply() {
        let err = TraitError::Apply {
            id: "mount".into(),
            source: Box::new(TraitError::Client(ClientError::connection("refused"))),
        };
        assert!(err.is_client_error());
        assert!(!TraitError::missing_kit("hello").is_client_error());
    }
}
