//! The monitor action: keeps deployed Integrations' phase and ready condition
//! in line with what their pods report.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use intop_client::{DynClient, DynProbeProxy, FIELD_STATUS_PHASE, ListOptions, ObjectKind};
use intop_core::labels::{INTEGRATION_LABEL, KIT_PRIORITY_LABEL};
use intop_core::{
    ConditionStatus, Integration, IntegrationCondition, IntegrationConditionType, IntegrationKit,
    IntegrationPhase, KitPhase, LabelSelector, MountResource, StorageType, digest, reason,
};
use intop_trait::{ResourceCollection, TraitCatalog, TraitError, integration_container_name};
use k8s_openapi::api::core::v1::Pod;

use crate::action::Action;
use crate::config::OperatorConfig;
use crate::controller::{WorkloadController, resolve_controller};
use crate::error::MonitorError;
use crate::kits::{find_highest_priority_ready_kit, lookup_kits_for_integration};
use crate::pods::are_pods_failing_statuses;
use crate::readiness::ReadinessProbe;

const POD_PENDING: &str = "Pending";
const POD_RUNNING: &str = "Running";

/// Monitors Integrations in the Deploying, Running and Error phases.
///
/// One pass re-reads the kit, the generated workload and its pods, then
/// decides the phase and the ready condition. Nothing is cached between
/// passes. Passes for different Integrations may run concurrently on one
/// action; passes for the same Integration must not.
pub struct MonitorAction {
    client: DynClient,
    proxy: DynProbeProxy,
    catalog: Arc<TraitCatalog>,
    operator_id: Option<String>,
    probe_timeout: Duration,
}

impl MonitorAction {
    pub fn new(client: DynClient, proxy: DynProbeProxy, catalog: Arc<TraitCatalog>) -> Self {
        Self {
            client,
            proxy,
            catalog,
            operator_id: None,
            probe_timeout: Duration::from_millis(1000),
        }
    }

    /// Applies the operator identity and probe settings of `config`.
    pub fn with_config(mut self, config: &OperatorConfig) -> Self {
        self.operator_id = config.operator.id.clone();
        self.probe_timeout = config.probe.timeout();
        self
    }

    async fn run(&self, mut integration: Integration) -> Result<Option<Integration>, MonitorError> {
        // No kit could be assigned: only a spec change gets it out of there.
        if is_in_initialization_failed(&integration) {
            let changed = self.check_digest_and_rebuild(&mut integration, None).await?;
            return Ok(changed.then_some(integration));
        }

        let reference = integration
            .status
            .integration_kit
            .clone()
            .ok_or_else(|| MonitorError::missing_kit(integration.name()))?;
        let kit = self
            .client
            .get_integration_kit(&reference.namespace, &reference.name)
            .await?
            .ok_or_else(|| MonitorError::kit_not_found(&reference.namespace, &reference.name))?;

        if is_in_integration_kit_failed(&integration) && kit.status.phase == KitPhase::Error {
            return Ok(None);
        }

        if self
            .check_digest_and_rebuild(&mut integration, Some(&kit))
            .await?
        {
            return Ok(Some(integration));
        }

        self.upgrade_kit(&mut integration, &kit).await?;

        let resources = match intop_trait::apply(
            self.client.as_ref(),
            &self.catalog,
            &mut integration,
            Some(kit),
        )
        .await
        {
            Ok(resources) => resources,
            Err(err @ TraitError::Apply { .. }) => {
                tracing::info!(
                    integration = %integration.name(),
                    error = %err,
                    "Trait pipeline failed"
                );
                integration.status.phase = IntegrationPhase::Error;
                integration.set_ready_condition(
                    ConditionStatus::False,
                    reason::INITIALIZATION_FAILED,
                    err.to_string(),
                );
                return Err(MonitorError::Pipeline {
                    integration: Box::new(integration),
                    source: err,
                });
            }
            Err(err) => return Err(err.into()),
        };

        self.monitor_pods(integration, &resources).await.map(Some)
    }

    /// Switches to a ready kit of strictly higher priority, if one exists.
    ///
    /// The current pass keeps running against the previous kit.
    async fn upgrade_kit(
        &self,
        integration: &mut Integration,
        kit: &IntegrationKit,
    ) -> Result<(), MonitorError> {
        let floor = kit.priority_value()?;
        let selector = LabelSelector::new().with_greater_than(KIT_PRIORITY_LABEL, floor);
        let kits = lookup_kits_for_integration(
            self.client.as_ref(),
            integration,
            integration.namespace(),
            selector,
        )
        .await?;

        if let Some(upgrade) = find_highest_priority_ready_kit(&kits, floor)? {
            tracing::info!(
                integration = %integration.name(),
                from = %kit.name(),
                to = %upgrade.name(),
                "Switching to a higher priority kit"
            );
            integration.set_integration_kit(Some(upgrade));
        }
        Ok(())
    }

    /// Resets the Integration when its digest changed. Returns whether it did.
    async fn check_digest_and_rebuild(
        &self,
        integration: &mut Integration,
        kit: Option<&IntegrationKit>,
    ) -> Result<bool, MonitorError> {
        let (configmaps, secrets) = self.watched_resource_versions(integration).await?;
        let hash = digest::compute_for_integration(integration, &configmaps, &secrets)?;
        if hash == integration.status.digest {
            return Ok(false);
        }

        tracing::info!(
            integration = %integration.name(),
            "Integration digest has changed: resetting its status"
        );
        if is_integration_kit_reset_required(integration, kit) {
            integration.set_integration_kit(None);
        }
        integration.initialize();
        integration.status.digest = hash;
        Ok(true)
    }

    /// Resource versions of the configmaps and secrets mounted with hot reload.
    ///
    /// Missing objects contribute an empty version.
    async fn watched_resource_versions(
        &self,
        integration: &Integration,
    ) -> Result<(Vec<String>, Vec<String>), MonitorError> {
        let mut configmaps = Vec::new();
        let mut secrets = Vec::new();

        let Some(mount) = integration
            .spec
            .traits
            .mount
            .as_ref()
            .filter(|m| m.hot_reload_enabled())
        else {
            return Ok((configmaps, secrets));
        };

        for entry in mount.all_entries() {
            let Ok(resource) = MountResource::parse(entry) else {
                continue;
            };
            let (kind, versions) = match resource.storage_type() {
                StorageType::ConfigMap => (ObjectKind::ConfigMap, &mut configmaps),
                StorageType::Secret => (ObjectKind::Secret, &mut secrets),
                StorageType::File => continue,
            };
            let version = self
                .client
                .resource_version(kind, integration.namespace(), resource.name())
                .await?;
            versions.push(version.unwrap_or_default());
        }
        Ok((configmaps, secrets))
    }

    async fn monitor_pods(
        &self,
        mut integration: Integration,
        resources: &ResourceCollection,
    ) -> Result<Integration, MonitorError> {
        let mut controller =
            resolve_controller(self.client.as_ref(), &integration, resources).await?;

        if !controller.has_integration_label() {
            integration.status.set_conditions([IntegrationCondition::new(
                IntegrationConditionType::Ready,
                ConditionStatus::False,
                reason::MONITORING_PODS_AVAILABLE,
                format!(
                    "Could not find `{INTEGRATION_LABEL}: {}` label in the {} template. Make sure to include this label in the template for Pod monitoring purposes.",
                    integration.name(),
                    controller.controller_name(),
                ),
            )]);
            return Ok(integration);
        }

        // Read by the scale subresource to find the Integration's pods.
        integration.status.selector = Some(format!("{INTEGRATION_LABEL}={}", integration.name()));

        let pending_pods = self.list_pods(&integration, POD_PENDING).await?;
        let running_pods = self.list_pods(&integration, POD_RUNNING).await?;
        let non_terminating = running_pods
            .iter()
            .filter(|pod| pod.metadata.deletion_timestamp.is_none())
            .count();
        integration.status.replicas = Some(to_i32(pending_pods.len() + non_terminating));

        let previous = integration.status.phase;
        if previous == IntegrationPhase::Deploying {
            integration.status.phase = IntegrationPhase::Running;
        }

        self.update_phase_and_ready_condition(
            controller.as_mut(),
            &mut integration,
            &pending_pods,
            &running_pods,
        )
        .await?;

        if integration.status.phase != previous {
            tracing::info!(
                integration = %integration.name(),
                from = %previous,
                to = %integration.status.phase,
                "Integration phase changed"
            );
        }
        Ok(integration)
    }

    async fn list_pods(&self, integration: &Integration, phase: &str) -> Result<Vec<Pod>, MonitorError> {
        let options = ListOptions::new()
            .with_labels(LabelSelector::new().with_label(INTEGRATION_LABEL, integration.name()))
            .with_field(FIELD_STATUS_PHASE, phase);
        Ok(self.client.list_pods(integration.namespace(), &options).await?)
    }

    async fn update_phase_and_ready_condition(
        &self,
        controller: &mut dyn WorkloadController,
        integration: &mut Integration,
        pending_pods: &[Pod],
        running_pods: &[Pod],
    ) -> Result<(), MonitorError> {
        let probe = ReadinessProbe::new(self.proxy.as_ref(), self.probe_timeout);
        let container = integration_container_name(integration).to_string();

        let decided = controller
            .check_ready_condition(self.client.as_ref(), integration)
            .await;
        if !matches!(decided, Ok(false)) {
            // Probe anyway so the ready condition carries the pod details.
            if let Err(err) = probe.probe(integration, &container, running_pods).await {
                tracing::debug!(
                    integration = %integration.name(),
                    error = %err,
                    "Readiness probe failed after a controller verdict"
                );
            }
            return decided.map(|_| ());
        }

        if are_pods_failing_statuses(integration, pending_pods, running_pods) {
            return Ok(());
        }

        let outcome = probe.probe(integration, &container, running_pods).await?;
        if !outcome.probe_ok {
            integration.status.phase = IntegrationPhase::Error;
        } else if controller.update_ready_condition(integration, outcome.ready_pods) {
            integration.status.phase = IntegrationPhase::Running;
        }
        Ok(())
    }
}

#[async_trait]
impl Action for MonitorAction {
    fn name(&self) -> &'static str {
        "monitor"
    }

    fn can_handle(&self, integration: &Integration) -> bool {
        let phase_handled = matches!(
            integration.status.phase,
            IntegrationPhase::Deploying | IntegrationPhase::Running | IntegrationPhase::Error
        );
        let owned = match (self.operator_id.as_deref(), integration.operator_id()) {
            (Some(expected), Some(actual)) => expected == actual,
            _ => true,
        };
        phase_handled && owned
    }

    async fn handle(&self, integration: &Integration) -> Result<Option<Integration>, MonitorError> {
        tracing::debug!(
            integration = %integration.name(),
            namespace = %integration.namespace(),
            phase = %integration.status.phase,
            client = self.client.backend_name(),
            "Monitoring integration"
        );
        self.run(integration.clone()).await
    }
}

fn to_i32(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

/// Phase Error with the ready condition recording an initialization failure.
pub fn is_in_initialization_failed(integration: &Integration) -> bool {
    integration.status.phase == IntegrationPhase::Error
        && integration.ready_condition().is_some_and(|c| {
            c.status == ConditionStatus::False && c.reason == reason::INITIALIZATION_FAILED
        })
}

/// Kit unavailable while the Integration has not been moved to Error yet.
pub fn is_in_integration_kit_failed(integration: &Integration) -> bool {
    integration.status.phase != IntegrationPhase::Error
        && integration
            .status
            .get_condition(IntegrationConditionType::KitAvailable)
            .is_some_and(|c| c.status == ConditionStatus::False)
}

/// Whether the kit was built for another operator or integration profile.
pub fn is_integration_kit_reset_required(
    integration: &Integration,
    kit: Option<&IntegrationKit>,
) -> bool {
    let Some(kit) = kit else {
        return false;
    };
    let differs = |ours: Option<&str>, theirs: Option<&str>| {
        ours.is_some_and(|value| !value.is_empty() && Some(value) != theirs)
    };
    differs(integration.operator_id(), kit.operator_id())
        || differs(integration.integration_profile(), kit.integration_profile())
        || differs(
            integration.integration_profile_namespace(),
            kit.integration_profile_namespace(),
        )
}
