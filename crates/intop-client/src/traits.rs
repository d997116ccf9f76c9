//! Traits for the collaborators the reconciliation core talks to.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use intop_core::{IntegrationKit, IntegrationPlatform, KnativeService, LabelSelector};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::Pod;

use crate::error::{ClientError, ProbeError};

/// Field selector key for the pod phase.
pub const FIELD_STATUS_PHASE: &str = "status.phase";

/// Kinds of objects whose resource version can be looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    ConfigMap,
    Secret,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigMap => write!(f, "ConfigMap"),
            Self::Secret => write!(f, "Secret"),
        }
    }
}

/// Label and field selectors for list calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub label_selector: LabelSelector,
    pub field_selector: BTreeMap<String, String>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_labels(mut self, selector: LabelSelector) -> Self {
        self.label_selector = self.label_selector.merge(selector);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.field_selector.insert(key.into(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.field_selector.get(key).map(String::as_str)
    }
}

/// Read access to the platform's object store.
///
/// Implementations must be safe for concurrent use: passes for different
/// Integrations share one client.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Lists the integration platforms registered in a namespace.
    async fn list_platforms(&self, namespace: &str)
    -> Result<Vec<IntegrationPlatform>, ClientError>;

    /// Reads a kit by name. Returns `None` if it does not exist.
    async fn get_integration_kit(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<IntegrationKit>, ClientError>;

    /// Lists kits in a namespace.
    async fn list_integration_kits(
        &self,
        namespace: &str,
        options: &ListOptions,
    ) -> Result<Vec<IntegrationKit>, ClientError>;

    /// Lists pods in a namespace. Supports the `status.phase` field selector.
    async fn list_pods(&self, namespace: &str, options: &ListOptions)
    -> Result<Vec<Pod>, ClientError>;

    /// Lists jobs in a namespace.
    async fn list_jobs(&self, namespace: &str, options: &ListOptions)
    -> Result<Vec<Job>, ClientError>;

    /// Reads the live Deployment. Returns `None` if it does not exist.
    async fn get_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Deployment>, ClientError>;

    /// Reads the live Knative Service. Returns `None` if it does not exist.
    async fn get_knative_service(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<KnativeService>, ClientError>;

    /// Reads the live CronJob. Returns `None` if it does not exist.
    async fn get_cron_job(&self, namespace: &str, name: &str)
    -> Result<Option<CronJob>, ClientError>;

    /// Current resource version of a named object. Returns `None` if it does not exist.
    async fn resource_version(
        &self,
        kind: ObjectKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<String>, ClientError>;

    /// Returns the name of this client backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}

/// Target of a proxied probe call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub namespace: String,
    pub pod: String,
    /// `http` or `https`.
    pub scheme: String,
    pub port: i32,
    pub path: String,
    pub timeout: Duration,
}

impl ProbeRequest {
    pub fn is_https(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("https")
    }
}

/// Performs an HTTP GET against a pod through the platform's proxy.
#[async_trait]
pub trait ProbeProxy: Send + Sync {
    /// Returns the response body on a 2xx answer.
    async fn get(&self, request: &ProbeRequest) -> Result<Vec<u8>, ProbeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_options_merge_labels() {
        let options = ListOptions::new()
            .with_labels(LabelSelector::new().with_label("a", "1"))
            .with_labels(LabelSelector::new().with_label("b", "2"))
            .with_field(FIELD_STATUS_PHASE, "Running");

        assert_eq!(options.label_selector.requirements().len(), 2);
        assert_eq!(options.field(FIELD_STATUS_PHASE), Some("Running"));
        assert_eq!(options.field("metadata.name"), None);
    }
}
