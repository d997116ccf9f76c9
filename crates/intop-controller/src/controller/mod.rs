//! Workload controllers: the per-kind view of the object running the pods.
//!
//! The trait pipeline marks exactly one `*Available` condition true; that
//! condition selects which generated object is monitored.

mod cron_job;
mod deployment;
mod knative;

pub use cron_job::CronJobController;
pub use deployment::DeploymentController;
pub use knative::KnativeServiceController;

use async_trait::async_trait;
use intop_client::PlatformClient;
use intop_core::labels::INTEGRATION_LABEL;
use intop_core::{Integration, MetaExt, WorkloadKind};
use intop_trait::ResourceCollection;
use k8s_openapi::api::core::v1::PodSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::error::MonitorError;

/// Readiness rules of one workload kind.
#[async_trait]
pub trait WorkloadController: Send + Sync {
    fn kind(&self) -> WorkloadKind;

    /// Human readable kind, used in condition messages.
    fn controller_name(&self) -> &'static str;

    /// Whether the pod template carries the label pods are discovered by.
    fn has_integration_label(&self) -> bool;

    fn pod_spec(&self) -> Option<&PodSpec>;

    /// Checks for a verdict that does not depend on the pods.
    ///
    /// Returns `true` when readiness is decided, in which case the caller
    /// skips pod based evaluation.
    async fn check_ready_condition(
        &mut self,
        client: &dyn PlatformClient,
        integration: &mut Integration,
    ) -> Result<bool, MonitorError>;

    /// Updates the ready condition given the number of ready pods.
    ///
    /// Returns `true` when the workload is ready.
    fn update_ready_condition(&self, integration: &mut Integration, ready_pods: i32) -> bool;
}

/// Resolves the controller of the workload selected by the pipeline.
///
/// The live object replaces the generated one when it exists, so readiness is
/// judged on the statuses the platform reports.
pub async fn resolve_controller(
    client: &dyn PlatformClient,
    integration: &Integration,
    resources: &ResourceCollection,
) -> Result<Box<dyn WorkloadController>, MonitorError> {
    let kind = WorkloadKind::all()
        .into_iter()
        .find(|kind| integration.is_condition_true(kind.available_condition()))
        .ok_or_else(|| {
            MonitorError::unsupported_controller(
                integration.name(),
                "no workload is marked available",
            )
        })?;

    let missing = || {
        MonitorError::unsupported_controller(
            integration.name(),
            format!("no {kind} in the generated resources"),
        )
    };
    let namespace = integration.namespace();

    let controller: Box<dyn WorkloadController> = match kind {
        WorkloadKind::Deployment => {
            let desired = resources.deployment().ok_or_else(missing)?;
            let live = client
                .get_deployment(namespace, desired.metadata.name_or_empty())
                .await?;
            Box::new(DeploymentController::new(live.unwrap_or_else(|| desired.clone())))
        }
        WorkloadKind::KnativeService => {
            let desired = resources.knative_service().ok_or_else(missing)?;
            let live = client
                .get_knative_service(namespace, desired.metadata.name_or_empty())
                .await?;
            Box::new(KnativeServiceController::new(
                live.unwrap_or_else(|| desired.clone()),
            ))
        }
        WorkloadKind::CronJob => {
            let desired = resources.cron_job().ok_or_else(missing)?;
            let live = client
                .get_cron_job(namespace, desired.metadata.name_or_empty())
                .await?;
            Box::new(CronJobController::new(live.unwrap_or_else(|| desired.clone())))
        }
    };

    tracing::debug!(
        integration = %integration.name(),
        controller = controller.controller_name(),
        "Workload controller resolved"
    );
    Ok(controller)
}

pub(crate) fn has_label(metadata: Option<&ObjectMeta>) -> bool {
    metadata.is_some_and(|m| m.label(INTEGRATION_LABEL).is_some())
}
