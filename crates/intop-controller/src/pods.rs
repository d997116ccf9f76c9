//! Pod level failure signals.

use intop_core::{Integration, IntegrationPhase, MetaExt};
use k8s_openapi::api::core::v1::{ContainerStatus, Pod, PodCondition};

const POD_SCHEDULED: &str = "PodScheduled";
const UNSCHEDULABLE: &str = "Unschedulable";
const WAITING_FAILURES: [&str; 2] = ["ImagePullBackOff", "CrashLoopBackOff"];
const TERMINATED_ERROR: &str = "Error";

pub(crate) fn pod_condition<'a>(pod: &'a Pod, type_: &str) -> Option<&'a PodCondition> {
    pod.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .and_then(|conditions| conditions.iter().find(|c| c.type_ == type_))
}

fn container_statuses(pod: &Pod) -> impl Iterator<Item = &ContainerStatus> {
    let status = pod.status.as_ref();
    let init = status.and_then(|s| s.init_container_statuses.as_deref());
    let main = status.and_then(|s| s.container_statuses.as_deref());
    init.unwrap_or_default()
        .iter()
        .chain(main.unwrap_or_default().iter())
}

/// Failure message of the first container stuck in a definitive failure.
fn failing_container_message(pod: &Pod) -> Option<String> {
    container_statuses(pod).find_map(|container| {
        let state = container.state.as_ref()?;
        if let Some(waiting) = &state.waiting {
            let reason = waiting.reason.as_deref().unwrap_or_default();
            if WAITING_FAILURES.iter().any(|r| *r == reason) {
                return Some(message_or_reason(waiting.message.as_deref(), reason));
            }
        }
        if let Some(terminated) = &state.terminated {
            let reason = terminated.reason.as_deref().unwrap_or_default();
            if reason == TERMINATED_ERROR {
                return Some(message_or_reason(terminated.message.as_deref(), reason));
            }
        }
        None
    })
}

fn message_or_reason(message: Option<&str>, reason: &str) -> String {
    match message {
        Some(message) if !message.is_empty() => message.to_string(),
        _ => reason.to_string(),
    }
}

/// Scans pods for states they will not recover from on their own.
///
/// A pending pod failing to schedule, or any container in image pull back-off,
/// crash loop back-off or terminated with an error, moves the Integration to
/// the Error phase with the platform's message on the ready condition.
/// Terminating running pods are ignored. Returns whether a failure was found.
pub fn are_pods_failing_statuses(
    integration: &mut Integration,
    pending_pods: &[Pod],
    running_pods: &[Pod],
) -> bool {
    let unschedulable = pending_pods.iter().find_map(|pod| {
        pod_condition(pod, POD_SCHEDULED)
            .filter(|c| c.status == "False" && c.reason.as_deref() == Some(UNSCHEDULABLE))
            .map(|c| message_or_reason(c.message.as_deref(), UNSCHEDULABLE))
    });

    let failure = unschedulable.or_else(|| {
        pending_pods
            .iter()
            .chain(running_pods.iter().filter(|p| !p.metadata.is_terminating()))
            .find_map(failing_container_message)
    });

    match failure {
        Some(message) => {
            tracing::debug!(
                integration = %integration.name(),
                message = %message,
                "Pod failure detected"
            );
            integration.status.phase = IntegrationPhase::Error;
            integration.set_ready_condition_error(message);
            true
        }
        None => false,
    }
}
