//! In-memory implementations of [`PlatformClient`] and [`ProbeProxy`].
//!
//! Useful for embedding the reconciliation core without a live cluster and
//! for tests. Label selectors are evaluated with the same semantics as the
//! platform; the only supported field selector is `status.phase` on pods.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use intop_core::{IntegrationKit, IntegrationPlatform, KnativeService, MetaExt};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tokio::sync::RwLock;

use crate::error::{ClientError, ProbeError};
use crate::traits::{
    FIELD_STATUS_PHASE, ListOptions, ObjectKind, PlatformClient, ProbeProxy, ProbeRequest,
};

#[derive(Default)]
struct State {
    platforms: Vec<IntegrationPlatform>,
    kits: Vec<IntegrationKit>,
    pods: Vec<Pod>,
    jobs: Vec<Job>,
    deployments: Vec<Deployment>,
    knative_services: Vec<KnativeService>,
    cron_jobs: Vec<CronJob>,
    versions: BTreeMap<(ObjectKind, String, String), String>,
    failures: HashMap<&'static str, ClientError>,
}

/// Platform client backed by in-memory object lists.
#[derive(Default)]
pub struct InMemoryPlatformClient {
    state: RwLock<State>,
}

impl InMemoryPlatformClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_platform(&self, platform: IntegrationPlatform) {
        self.state.write().await.platforms.push(platform);
    }

    pub async fn add_kit(&self, kit: IntegrationKit) {
        self.state.write().await.kits.push(kit);
    }

    pub async fn add_pod(&self, pod: Pod) {
        self.state.write().await.pods.push(pod);
    }

    pub async fn add_job(&self, job: Job) {
        self.state.write().await.jobs.push(job);
    }

    pub async fn add_deployment(&self, deployment: Deployment) {
        self.state.write().await.deployments.push(deployment);
    }

    pub async fn add_knative_service(&self, service: KnativeService) {
        self.state.write().await.knative_services.push(service);
    }

    pub async fn add_cron_job(&self, cron_job: CronJob) {
        self.state.write().await.cron_jobs.push(cron_job);
    }

    pub async fn set_resource_version(
        &self,
        kind: ObjectKind,
        namespace: &str,
        name: &str,
        version: &str,
    ) {
        self.state.write().await.versions.insert(
            (kind, namespace.to_string(), name.to_string()),
            version.to_string(),
        );
    }

    /// Makes every call of the named operation (`"list_pods"`, ...) fail.
    pub async fn fail_operation(&self, operation: &'static str, error: ClientError) {
        self.state.write().await.failures.insert(operation, error);
    }

    fn check_failure(state: &State, operation: &'static str) -> Result<(), ClientError> {
        match state.failures.get(operation) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn find_named<'a, T, F>(items: &'a [T], meta: F, namespace: &str, name: &str) -> Option<&'a T>
where
    F: Fn(&T) -> &ObjectMeta,
{
    items.iter().find(|item| {
        let meta = meta(item);
        meta.namespace_or_empty() == namespace && meta.name_or_empty() == name
    })
}

fn pod_phase(pod: &Pod) -> &str {
    pod.status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .unwrap_or_default()
}

#[async_trait]
impl PlatformClient for InMemoryPlatformClient {
    async fn list_platforms(
        &self,
        namespace: &str,
    ) -> Result<Vec<IntegrationPlatform>, ClientError> {
        let state = self.state.read().await;
        Self::check_failure(&state, "list_platforms")?;
        Ok(state
            .platforms
            .iter()
            .filter(|p| p.namespace() == namespace)
            .cloned()
            .collect())
    }

    async fn get_integration_kit(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<IntegrationKit>, ClientError> {
        let state = self.state.read().await;
        Self::check_failure(&state, "get_integration_kit")?;
        Ok(state
            .kits
            .iter()
            .find(|k| k.namespace() == namespace && k.name() == name)
            .cloned())
    }

    async fn list_integration_kits(
        &self,
        namespace: &str,
        options: &ListOptions,
    ) -> Result<Vec<IntegrationKit>, ClientError> {
        let state = self.state.read().await;
        Self::check_failure(&state, "list_integration_kits")?;
        if !options.field_selector.is_empty() {
            return Err(ClientError::api("field selectors are not supported for kits"));
        }
        Ok(state
            .kits
            .iter()
            .filter(|k| k.namespace() == namespace)
            .filter(|k| options.label_selector.matches(k.metadata.labels.as_ref()))
            .cloned()
            .collect())
    }

    async fn list_pods(
        &self,
        namespace: &str,
        options: &ListOptions,
    ) -> Result<Vec<Pod>, ClientError> {
        let state = self.state.read().await;
        Self::check_failure(&state, "list_pods")?;
        if let Some(key) = options
            .field_selector
            .keys()
            .find(|k| k.as_str() != FIELD_STATUS_PHASE)
        {
            return Err(ClientError::api(format!("unsupported field selector {key}")));
        }
        let phase = options.field(FIELD_STATUS_PHASE);
        Ok(state
            .pods
            .iter()
            .filter(|p| p.metadata.namespace_or_empty() == namespace)
            .filter(|p| options.label_selector.matches(p.metadata.labels.as_ref()))
            .filter(|p| phase.is_none_or(|phase| pod_phase(p) == phase))
            .cloned()
            .collect())
    }

    async fn list_jobs(
        &self,
        namespace: &str,
        options: &ListOptions,
    ) -> Result<Vec<Job>, ClientError> {
        let state = self.state.read().await;
        Self::check_failure(&state, "list_jobs")?;
        Ok(state
            .jobs
            .iter()
            .filter(|j| j.metadata.namespace_or_empty() == namespace)
            .filter(|j| options.label_selector.matches(j.metadata.labels.as_ref()))
            .cloned()
            .collect())
    }

    async fn get_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Deployment>, ClientError> {
        let state = self.state.read().await;
        Self::check_failure(&state, "get_deployment")?;
        Ok(find_named(&state.deployments, |d| &d.metadata, namespace, name).cloned())
    }

    async fn get_knative_service(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<KnativeService>, ClientError> {
        let state = self.state.read().await;
        Self::check_failure(&state, "get_knative_service")?;
        Ok(find_named(&state.knative_services, |s| &s.metadata, namespace, name).cloned())
    }

    async fn get_cron_job(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<CronJob>, ClientError> {
        let state = self.state.read().await;
        Self::check_failure(&state, "get_cron_job")?;
        Ok(find_named(&state.cron_jobs, |c| &c.metadata, namespace, name).cloned())
    }

    async fn resource_version(
        &self,
        kind: ObjectKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<String>, ClientError> {
        let state = self.state.read().await;
        Self::check_failure(&state, "resource_version")?;
        Ok(state
            .versions
            .get(&(kind, namespace.to_string(), name.to_string()))
            .cloned())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Probe proxy answering from a per-pod script.
///
/// Pods without a scripted answer respond with an empty 200.
#[derive(Default)]
pub struct ScriptedProbeProxy {
    answers: RwLock<HashMap<String, Result<Vec<u8>, ProbeError>>>,
    requests: RwLock<Vec<ProbeRequest>>,
}

impl ScriptedProbeProxy {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn answer(&self, pod: &str, answer: Result<Vec<u8>, ProbeError>) {
        self.answers.write().await.insert(pod.to_string(), answer);
    }

    /// Requests received so far, in order.
    pub async fn requests(&self) -> Vec<ProbeRequest> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl ProbeProxy for ScriptedProbeProxy {
    async fn get(&self, request: &ProbeRequest) -> Result<Vec<u8>, ProbeError> {
        self.requests.write().await.push(request.clone());
        self.answers
            .read()
            .await
            .get(&request.pod)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intop_core::LabelSelector;
    use intop_core::labels::{INTEGRATION_LABEL, KIT_PRIORITY_LABEL};
    use k8s_openapi::api::core::v1::PodStatus;

    fn pod(name: &str, integration: &str, phase: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name.into()),
                namespace: Some("default".into()),
                labels: Some([(INTEGRATION_LABEL.to_string(), integration.to_string())].into()),
                ..Default::default()
            },
            status: Some(PodStatus {
                phase: Some(phase.into()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_list_pods_by_label_and_phase() {
        let client = InMemoryPlatformClient::new();
        client.add_pod(pod("a", "hello", "Running")).await;
        client.add_pod(pod("b", "hello", "Pending")).await;
        client.add_pod(pod("c", "other", "Running")).await;

        let options = ListOptions::new()
            .with_labels(LabelSelector::new().with_label(INTEGRATION_LABEL, "hello"))
            .with_field(FIELD_STATUS_PHASE, "Running");
        let pods = client.list_pods("default", &options).await.unwrap();

        assert_eq!(pods.len(), 1);
        assert_eq!(pods[0].metadata.name.as_deref(), Some("a"));
        assert!(client.list_pods("other-ns", &options).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_field_selector() {
        let client = InMemoryPlatformClient::new();
        let options = ListOptions::new().with_field("spec.nodeName", "node-1");
        let err = client.list_pods("default", &options).await.unwrap_err();
        assert!(matches!(err, ClientError::Api { .. }));
    }

    #[tokio::test]
    async fn test_list_kits_by_priority() {
        let client = InMemoryPlatformClient::new();
        for (name, priority) in [("low", "1"), ("high", "9")] {
            let mut kit = IntegrationKit::new("default", name);
            kit.metadata.labels = Some([(KIT_PRIORITY_LABEL.to_string(), priority.to_string())].into());
            client.add_kit(kit).await;
        }

        let options = ListOptions::new()
            .with_labels(LabelSelector::new().with_greater_than(KIT_PRIORITY_LABEL, 1));
        let kits = client.list_integration_kits("default", &options).await.unwrap();
        assert_eq!(kits.len(), 1);
        assert_eq!(kits[0].name(), "high");
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let client = InMemoryPlatformClient::new();
        client
            .fail_operation("list_pods", ClientError::connection("api down"))
            .await;
        let err = client
            .list_pods("default", &ListOptions::new())
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_scripted_probe_records_requests() {
        let proxy = ScriptedProbeProxy::new();
        proxy.answer("a", Err(ProbeError::DeadlineExceeded)).await;

        let request = ProbeRequest {
            namespace: "default".into(),
            pod: "a".into(),
            scheme: "http".into(),
            port: 8080,
            path: "/ready".into(),
            timeout: std::time::Duration::from_secs(1),
        };
        assert!(proxy.get(&request).await.unwrap_err().is_deadline_exceeded());

        let other = ProbeRequest {
            pod: "b".into(),
            ..request.clone()
        };
        assert!(proxy.get(&other).await.unwrap().is_empty());
        assert_eq!(proxy.requests().await.len(), 2);
    }
}
