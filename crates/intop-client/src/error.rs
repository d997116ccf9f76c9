//! Error types for platform API access and pod probing.

use std::fmt;

/// Errors returned by a [`PlatformClient`](crate::PlatformClient).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// The requested object does not exist.
    #[error("{kind} not found: {namespace}/{name}")]
    NotFound {
        /// Kind of the missing object.
        kind: String,
        /// Namespace that was searched.
        namespace: String,
        /// Name of the missing object.
        name: String,
    },

    /// The API rejected the request.
    #[error("API error: {message}")]
    Api {
        /// Description returned by the API.
        message: String,
    },

    /// The API could not be reached.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection failure.
        message: String,
    },

    /// The request was abandoned before completion.
    #[error("Request cancelled: {message}")]
    Cancelled {
        /// What was being requested.
        message: String,
    },
}

impl ClientError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Creates a new `Api` error.
    #[must_use]
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Creates a new `Connection` error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a new `Cancelled` error.
    #[must_use]
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::Cancelled {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` when retrying the whole pass later may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Cancelled { .. })
    }
}

/// Outcome of a proxied HTTP probe call that did not succeed.
///
/// The distinction between the variants drives readiness classification:
/// only `ServiceUnavailable` carries a body worth parsing.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProbeError {
    /// The probe did not answer within its deadline.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// The probe answered `503 Service Unavailable`.
    #[error("the server is currently unable to handle the request (503)")]
    ServiceUnavailable {
        /// Raw response body.
        body: Vec<u8>,
    },

    /// The probe answered with another non-success status.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, lossily decoded.
        body: String,
    },

    /// The request could not be sent or the response could not be read.
    #[error("{0}")]
    Transport(String),
}

impl ProbeError {
    /// Creates a new `Transport` error.
    #[must_use]
    pub fn transport(message: impl fmt::Display) -> Self {
        Self::Transport(message.to_string())
    }

    /// Returns `true` if the probe timed out.
    #[must_use]
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded)
    }

    /// Returns `true` if the probe answered 503.
    #[must_use]
    pub fn is_service_unavailable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable { .. })
    }
}
