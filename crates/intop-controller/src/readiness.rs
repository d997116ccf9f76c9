//! Readiness probing of not-yet-ready pods.
//!
//! Pods already reporting `PodReady=True` are counted and skipped. For the
//! others the readiness probe declared on the integration container is called
//! through the platform proxy, and a `503` answer is parsed as a health report
//! so the failing checks can be recorded against the pod.

use std::time::Duration;

use intop_client::{ProbeError, ProbeProxy, ProbeRequest};
use intop_core::{
    ConditionStatus, HealthCheck, Integration, IntegrationCondition, IntegrationConditionType,
    MetaExt, PodConditionSnapshot, reason,
};
use k8s_openapi::api::core::v1::{Container, HTTPGetAction, Pod, PodCondition};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use crate::error::MonitorError;
use crate::pods::pod_condition;

const POD_READY: &str = "Ready";

/// Aggregate result of one probing round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Pods reporting `PodReady=True`.
    pub ready_pods: i32,
    /// `false` when any pod timed out, failed its probe or reported a down check.
    pub probe_ok: bool,
}

/// Probes pods through a [`ProbeProxy`].
pub struct ReadinessProbe<'a> {
    proxy: &'a dyn ProbeProxy,
    default_timeout: Duration,
}

#[derive(Default)]
struct Tally {
    ready: i32,
    unready: i32,
    runtime_ready: bool,
    runtime_failed: bool,
    pods: Vec<PodConditionSnapshot>,
}

impl<'a> ReadinessProbe<'a> {
    /// `default_timeout` applies to probes that do not declare `timeoutSeconds`.
    pub fn new(proxy: &'a dyn ProbeProxy, default_timeout: Duration) -> Self {
        Self {
            proxy,
            default_timeout,
        }
    }

    /// Probes `pods` and records any failure on the ready condition.
    ///
    /// The ready condition is only written when a pod timed out, failed its
    /// probe or reported a down check. The reason is `Error` if a check was
    /// down, `RuntimeNotReady` otherwise.
    pub async fn probe(
        &self,
        integration: &mut Integration,
        container_name: &str,
        pods: &[Pod],
    ) -> Result<ProbeOutcome, MonitorError> {
        let mut tally = Tally {
            runtime_ready: true,
            ..Default::default()
        };

        for pod in pods {
            self.probe_pod(pod, container_name, &mut tally).await?;
        }

        let probe_ok = tally.runtime_ready && !tally.runtime_failed;
        if !probe_ok {
            let reason = if tally.runtime_failed {
                reason::ERROR
            } else {
                reason::RUNTIME_NOT_READY
            };
            let mut condition = IntegrationCondition::new(
                IntegrationConditionType::Ready,
                ConditionStatus::False,
                reason,
                format!(
                    "{}/{} pods are not ready",
                    tally.unready,
                    tally.unready + tally.ready
                ),
            );
            condition.pods = tally.pods;
            integration.status.set_conditions([condition]);
        }

        Ok(ProbeOutcome {
            ready_pods: tally.ready,
            probe_ok,
        })
    }

    async fn probe_pod(
        &self,
        pod: &Pod,
        container_name: &str,
        tally: &mut Tally,
    ) -> Result<(), MonitorError> {
        let condition = pod_condition(pod, POD_READY).cloned().unwrap_or_else(|| PodCondition {
            type_: POD_READY.to_string(),
            status: ConditionStatus::Unknown.to_string(),
            ..Default::default()
        });
        if condition.status == ConditionStatus::True.as_str() {
            tally.ready += 1;
            tally.pods.push(snapshot(pod, condition));
            return Ok(());
        }
        tally.unready += 1;

        let namespace = pod.metadata.namespace_or_empty();
        let name = pod.metadata.name_or_empty();
        let container = find_container(pod, container_name).ok_or_else(|| {
            MonitorError::missing_container(container_name, format!("{namespace}/{name}"))
        })?;

        let mut snapshot = snapshot(pod, condition);

        let http = container
            .readiness_probe
            .as_ref()
            .and_then(|probe| probe.http_get.as_ref().map(|http| (probe, http)));
        if let Some((probe, http)) = http {
            let timeout = probe
                .timeout_seconds
                .filter(|s| *s > 0)
                .map(|s| Duration::from_secs(s.unsigned_abs().into()))
                .unwrap_or(self.default_timeout);

            let result = match resolve_port(container, http) {
                Some(port) => {
                    let request = ProbeRequest {
                        namespace: namespace.to_string(),
                        pod: name.to_string(),
                        scheme: http.scheme.clone().unwrap_or_else(|| "http".to_string()),
                        port,
                        path: http.path.clone().unwrap_or_else(|| "/".to_string()),
                        timeout,
                    };
                    match tokio::time::timeout(timeout, self.proxy.get(&request)).await {
                        Ok(result) => result.map(|_| ()),
                        Err(_) => Err(ProbeError::DeadlineExceeded),
                    }
                }
                None => Err(ProbeError::transport(format!(
                    "no container port matches {:?}",
                    http.port
                ))),
            };

            match result {
                Ok(()) => {}
                Err(ProbeError::DeadlineExceeded) => {
                    tracing::warn!(pod = %name, namespace = %namespace, "Readiness probe timed out");
                    snapshot.condition.message =
                        Some(format!("readiness probe timed out for Pod {namespace}/{name}"));
                    tally.runtime_ready = false;
                }
                Err(ProbeError::ServiceUnavailable { body }) if !body.is_empty() => {
                    let health = HealthCheck::parse(&body)?;
                    for check in health.failing_checks() {
                        tally.runtime_ready = false;
                        tally.runtime_failed = true;
                        snapshot.health.push(check.clone());
                    }
                }
                Err(err) => {
                    tracing::warn!(pod = %name, namespace = %namespace, error = %err, "Readiness probe failed");
                    snapshot.condition.message = Some(format!(
                        "readiness probe failed for Pod {namespace}/{name}: {err}"
                    ));
                    tally.runtime_ready = false;
                }
            }
        }

        tally.pods.push(snapshot);
        Ok(())
    }
}

fn snapshot(pod: &Pod, condition: PodCondition) -> PodConditionSnapshot {
    PodConditionSnapshot {
        name: pod.metadata.name_or_empty().to_string(),
        condition,
        health: Vec::new(),
    }
}

fn find_container<'p>(pod: &'p Pod, name: &str) -> Option<&'p Container> {
    pod.spec
        .as_ref()
        .and_then(|spec| spec.containers.iter().find(|c| c.name == name))
}

/// Numeric port of the probe. Named ports are looked up on the container.
fn resolve_port(container: &Container, http: &HTTPGetAction) -> Option<i32> {
    match &http.port {
        IntOrString::Int(port) => Some(*port),
        IntOrString::String(named) => match named.parse::<i32>() {
            Ok(port) => Some(port),
            Err(_) => container
                .ports
                .as_deref()
                .unwrap_or_default()
                .iter()
                .find(|p| p.name.as_deref() == Some(named.as_str()))
                .map(|p| p.container_port),
        },
    }
}
