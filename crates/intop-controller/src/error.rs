//! Errors surfaced by a reconciliation pass.

use std::fmt;

use intop_client::ClientError;
use intop_core::{CoreError, Integration};
use intop_trait::TraitError;

/// Broad class of a [`MonitorError`], driving how the caller reacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The Integration, kit or generated workload is inconsistent.
    Configuration,
    /// A trait failed. The Integration status already records the failure.
    Pipeline,
    /// The platform API failed. Retrying the pass later may succeed.
    Infrastructure,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Pipeline => write!(f, "pipeline"),
            Self::Infrastructure => write!(f, "infrastructure"),
        }
    }
}

/// Errors returned by [`Action::handle`](crate::Action::handle).
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The Integration does not reference a kit.
    #[error("no kit set on integration {integration}")]
    MissingKit { integration: String },

    /// The referenced kit does not exist.
    #[error("unable to find integration kit {namespace}/{name}")]
    KitNotFound { namespace: String, name: String },

    /// No workload controller could be resolved from the generated resources.
    #[error("unsupported controller for integration {integration}: {message}")]
    UnsupportedController { integration: String, message: String },

    /// A pod does not run the integration container.
    #[error("integration container {container} not found in Pod {pod}")]
    MissingContainer { container: String, pod: String },

    /// The trait pipeline failed. `integration` carries the status recording it.
    #[error("error during trait customization: {source}")]
    Pipeline {
        integration: Box<Integration>,
        #[source]
        source: TraitError,
    },

    /// A workload reached a state it cannot recover from.
    #[error("{0}")]
    Workload(String),

    /// Model level failure (priority label, health payload, ...).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Platform API failure.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Environment assembly failed before any trait ran.
    #[error(transparent)]
    Environment(TraitError),
}

impl MonitorError {
    /// Creates a new `MissingKit` error.
    #[must_use]
    pub fn missing_kit(integration: impl Into<String>) -> Self {
        Self::MissingKit {
            integration: integration.into(),
        }
    }

    /// Creates a new `KitNotFound` error.
    #[must_use]
    pub fn kit_not_found(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::KitNotFound {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Creates a new `UnsupportedController` error.
    #[must_use]
    pub fn unsupported_controller(
        integration: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::UnsupportedController {
            integration: integration.into(),
            message: message.into(),
        }
    }

    /// Creates a new `MissingContainer` error.
    #[must_use]
    pub fn missing_container(container: impl Into<String>, pod: impl Into<String>) -> Self {
        Self::MissingContainer {
            container: container.into(),
            pod: pod.into(),
        }
    }

    /// Creates a new `Workload` error.
    #[must_use]
    pub fn workload(message: impl Into<String>) -> Self {
        Self::Workload(message.into())
    }

    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Pipeline { .. } => ErrorCategory::Pipeline,
            Self::Client(_) => ErrorCategory::Infrastructure,
            Self::Environment(source) if source.is_client_error() => ErrorCategory::Infrastructure,
            _ => ErrorCategory::Configuration,
        }
    }

    /// Returns `true` when retrying the pass later may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Infrastructure
    }

    /// Integration as mutated by the failed pass, if the caller should persist it.
    #[must_use]
    pub fn integration(&self) -> Option<&Integration> {
        match self {
            Self::Pipeline { integration, .. } => Some(integration.as_ref()),
            _ => None,
        }
    }
}

impl From<TraitError> for MonitorError {
    fn from(err: TraitError) -> Self {
        match err {
            TraitError::Client(client) => Self::Client(client),
            other => Self::Environment(other),
        }
    }
}
