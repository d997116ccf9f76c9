//! Per-pass context the traits read from and write into.

use std::collections::BTreeMap;

use intop_client::PlatformClient;
use intop_core::labels::INTEGRATION_LABEL;
use intop_core::{
    ConditionStatus, Integration, IntegrationCondition, IntegrationKit, IntegrationPlatform,
    TraitProfile, WorkloadKind, reason, select_active_platform,
};

use crate::collection::ResourceCollection;
use crate::error::TraitError;

/// Name of the container running the integration when the container trait does not set one.
pub const DEFAULT_CONTAINER_NAME: &str = "integration";

/// Everything one pipeline pass needs.
///
/// Built fresh for every pass: traits derive their output from the
/// Integration, the kit and the platform only, never from a previous pass.
pub struct Environment<'a> {
    pub platform: IntegrationPlatform,
    pub kit: IntegrationKit,
    pub integration: &'a mut Integration,
    pub executed_traits: Vec<String>,
    pub resources: ResourceCollection,
}

impl<'a> Environment<'a> {
    /// Resolves the platform and, unless given, the kit of `integration`.
    ///
    /// Nothing is written to the Integration when resolution fails.
    pub async fn new(
        client: &dyn PlatformClient,
        integration: &'a mut Integration,
        kit: Option<IntegrationKit>,
    ) -> Result<Self, TraitError> {
        let platforms = client.list_platforms(integration.namespace()).await?;
        let platform = select_active_platform(&platforms)
            .cloned()
            .ok_or_else(|| TraitError::missing_platform(integration.namespace()))?;

        let kit = match kit {
            Some(kit) => kit,
            None => {
                let reference = integration
                    .status
                    .integration_kit
                    .clone()
                    .ok_or_else(|| TraitError::missing_kit(integration.name()))?;
                let namespace = if reference.namespace.is_empty() {
                    integration.namespace().to_string()
                } else {
                    reference.namespace
                };
                client
                    .get_integration_kit(&namespace, &reference.name)
                    .await?
                    .ok_or_else(|| TraitError::missing_kit(integration.name()))?
            }
        };

        tracing::debug!(
            integration = %integration.name(),
            platform = %platform.name(),
            kit = %kit.name(),
            "Environment assembled"
        );

        Ok(Self::from_parts(platform, kit, integration))
    }

    /// Builds an environment from already resolved objects.
    pub fn from_parts(
        platform: IntegrationPlatform,
        kit: IntegrationKit,
        integration: &'a mut Integration,
    ) -> Self {
        Self {
            platform,
            kit,
            integration,
            executed_traits: Vec::new(),
            resources: ResourceCollection::new(),
        }
    }

    /// Workload kind the Integration is materialized into.
    ///
    /// An explicit deployer kind wins, then a cron schedule, then Knative when
    /// requested by the Integration or the platform profile.
    pub fn controller_strategy(&self) -> WorkloadKind {
        let traits = &self.integration.spec.traits;

        if let Some(kind) = traits.deployer.as_ref().and_then(|d| d.kind) {
            return kind;
        }

        if traits
            .cron
            .as_ref()
            .is_some_and(|c| c.enabled != Some(false) && c.schedule.is_some())
        {
            return WorkloadKind::CronJob;
        }

        let knative = traits.knative_service.as_ref().and_then(|k| k.enabled);
        let knative_profile = self.platform.spec.profile == Some(TraitProfile::Knative)
            || self.integration.spec.profile.as_deref() == Some("Knative");
        match knative {
            Some(true) => WorkloadKind::KnativeService,
            None if knative_profile => WorkloadKind::KnativeService,
            _ => WorkloadKind::Deployment,
        }
    }

    pub fn integration_container_name(&self) -> &str {
        integration_container_name(&*self.integration)
    }

    /// Image to run: the container trait override, then the kit's image,
    /// then the one recorded on the Integration.
    pub fn image(&self) -> Option<String> {
        self.integration
            .spec
            .traits
            .container
            .as_ref()
            .and_then(|c| c.image.clone())
            .or_else(|| self.kit.image().map(str::to_string))
            .or_else(|| self.integration.status.image.clone())
    }

    /// Labels every workload object and pod template carries.
    pub fn integration_labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(
            INTEGRATION_LABEL.to_string(),
            self.integration.name().to_string(),
        )])
    }

    pub fn is_trait_executed(&self, id: &str) -> bool {
        self.executed_traits.iter().any(|t| t == id)
    }

    /// Marks `kind` as the available workload and the other kinds as not available.
    pub fn set_workload_available(&mut self, kind: WorkloadKind, message: impl Into<String>) {
        let message = message.into();
        let strategy = format!("controller strategy: {kind}");
        let conditions = WorkloadKind::all().into_iter().map(|k| {
            let status = ConditionStatus::from(k == kind);
            let message = if k == kind {
                message.clone()
            } else {
                strategy.clone()
            };
            IntegrationCondition::new(k.available_condition(), status, workload_reason(k), message)
        });
        self.integration.status.set_conditions(conditions.collect::<Vec<_>>());
    }
}

fn workload_reason(kind: WorkloadKind) -> &'static str {
    match kind {
        WorkloadKind::Deployment => reason::DEPLOYMENT_AVAILABLE,
        WorkloadKind::KnativeService => reason::KNATIVE_SERVICE_AVAILABLE,
        WorkloadKind::CronJob => reason::CRON_JOB_AVAILABLE,
    }
}

/// Name of the container running the integration in the generated pods.
pub fn integration_container_name(integration: &Integration) -> &str {
    integration
        .spec
        .traits
        .container
        .as_ref()
        .and_then(|c| c.name.as_deref())
        .unwrap_or(DEFAULT_CONTAINER_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use intop_client::InMemoryPlatformClient;
    use intop_core::integration::{
        CronTraitSpec, DeployerTraitSpec, KnativeServiceTraitSpec,
    };
    use intop_core::{IntegrationConditionType, KitReference, PlatformPhase};

    fn platform() -> IntegrationPlatform {
        let mut platform = IntegrationPlatform::new("default", "intop");
        platform.status.phase = PlatformPhase::Ready;
        platform
    }

    fn kit() -> IntegrationKit {
        let mut kit = IntegrationKit::new("default", "kit-1");
        kit.status.image = Some("registry/kit-1:latest".into());
        kit
    }

    #[tokio::test]
    async fn test_new_resolves_platform_and_kit() {
        let client = InMemoryPlatformClient::new();
        client.add_platform(platform()).await;
        client.add_kit(kit()).await;

        let mut it = Integration::new("default", "hello");
        it.status.integration_kit = Some(KitReference {
            name: "kit-1".into(),
            namespace: "default".into(),
        });

        let env = Environment::new(&client, &mut it, None).await.unwrap();
        assert_eq!(env.platform.name(), "intop");
        assert_eq!(env.kit.name(), "kit-1");
        assert!(env.resources.is_empty());
        assert_eq!(env.image().as_deref(), Some("registry/kit-1:latest"));
    }

    #[tokio::test]
    async fn test_new_without_platform_fails() {
        let client = InMemoryPlatformClient::new();
        let mut it = Integration::new("default", "hello");
        let err = Environment::new(&client, &mut it, Some(kit()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, TraitError::MissingPlatform { .. }));
    }

    #[tokio::test]
    async fn test_new_without_kit_reference_fails() {
        let client = InMemoryPlatformClient::new();
        client.add_platform(platform()).await;
        let mut it = Integration::new("default", "hello");
        let before = it.clone();

        let err = Environment::new(&client, &mut it, None).await.err().unwrap();
        assert!(matches!(err, TraitError::MissingKit { .. }));
        assert_eq!(it, before);
    }

    #[test]
    fn test_controller_strategy() {
        let mut it = Integration::new("default", "hello");
        let strategy = |it: &mut Integration, platform: IntegrationPlatform| {
            Environment::from_parts(platform, kit(), it).controller_strategy()
        };
        assert_eq!(strategy(&mut it, platform()), WorkloadKind::Deployment);

        let mut knative_platform = platform();
        knative_platform.spec.profile = Some(TraitProfile::Knative);
        assert_eq!(strategy(&mut it, knative_platform.clone()), WorkloadKind::KnativeService);

        it.spec.traits.knative_service = Some(KnativeServiceTraitSpec {
            enabled: Some(false),
            ..Default::default()
        });
        assert_eq!(strategy(&mut it, knative_platform), WorkloadKind::Deployment);

        it.spec.traits.cron = Some(CronTraitSpec {
            schedule: Some("*/5 * * * *".into()),
            ..Default::default()
        });
        assert_eq!(strategy(&mut it, platform()), WorkloadKind::CronJob);

        it.spec.traits.deployer = Some(DeployerTraitSpec {
            kind: Some(WorkloadKind::Deployment),
        });
        assert_eq!(strategy(&mut it, platform()), WorkloadKind::Deployment);
    }

    #[test]
    fn test_set_workload_available_is_exclusive() {
        let mut it = Integration::new("default", "hello");
        let mut env = Environment::from_parts(platform(), kit(), &mut it);
        env.set_workload_available(WorkloadKind::CronJob, "cronjob name is hello");

        assert!(it.is_condition_true(IntegrationConditionType::CronJobAvailable));
        assert!(!it.is_condition_true(IntegrationConditionType::DeploymentAvailable));
        assert!(!it.is_condition_true(IntegrationConditionType::KnativeServiceAvailable));
        assert_eq!(it.status.conditions.len(), 3);
    }
}
