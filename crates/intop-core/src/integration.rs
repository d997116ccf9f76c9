//! The Integration resource: user declared intent plus the status the
//! reconciliation actions maintain on it.

use std::fmt;

use chrono::Utc;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

use crate::condition::{
    ConditionStatus, IntegrationCondition, IntegrationConditionType, reason,
};
use crate::kit::{IntegrationKit, KitPhase};
use crate::labels::{
    INTEGRATION_PROFILE_ANNOTATION, INTEGRATION_PROFILE_NAMESPACE_ANNOTATION,
    OPERATOR_ID_ANNOTATION,
};
use crate::meta::MetaExt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntegrationPhase {
    #[default]
    #[serde(rename = "")]
    None,
    Initialization,
    WaitingForPlatform,
    BuildingKit,
    Deploying,
    Running,
    Error,
}

impl fmt::Display for IntegrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "",
            Self::Initialization => "Initialization",
            Self::WaitingForPlatform => "WaitingForPlatform",
            Self::BuildingKit => "BuildingKit",
            Self::Deploying => "Deploying",
            Self::Running => "Running",
            Self::Error => "Error",
        };
        f.write_str(s)
    }
}

/// Concrete workload kinds an Integration can be materialized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkloadKind {
    Deployment,
    KnativeService,
    CronJob,
}

impl WorkloadKind {
    /// Condition the owning trait sets to true once it produced the workload.
    pub fn available_condition(&self) -> IntegrationConditionType {
        match self {
            Self::Deployment => IntegrationConditionType::DeploymentAvailable,
            Self::KnativeService => IntegrationConditionType::KnativeServiceAvailable,
            Self::CronJob => IntegrationConditionType::CronJobAvailable,
        }
    }

    pub fn all() -> [WorkloadKind; 3] {
        [Self::Deployment, Self::KnativeService, Self::CronJob]
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deployment => write!(f, "deployment"),
            Self::KnativeService => write!(f, "knative-service"),
            Self::CronJob => write!(f, "cron-job"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpec {
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerTraitSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronTraitSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency_policy: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployerTraitSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<WorkloadKind>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthTraitSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness_probe_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness_timeout: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness_period: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness_failure_threshold: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnativeServiceTraitSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_scale: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_scale: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MountTraitSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub configs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hot_reload: Option<bool>,
}

impl MountTraitSpec {
    pub fn hot_reload_enabled(&self) -> bool {
        self.hot_reload.unwrap_or(false)
    }

    /// Configs first, then resources.
    pub fn all_entries(&self) -> impl Iterator<Item = &String> {
        self.configs.iter().chain(self.resources.iter())
    }
}

/// Trait configuration declared on the Integration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Traits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerTraitSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<CronTraitSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployer: Option<DeployerTraitSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthTraitSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knative_service: Option<KnativeServiceTraitSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount: Option<MountTraitSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub traits: Traits,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitReference {
    pub name: String,
    pub namespace: String,
}

impl fmt::Display for KitReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationStatus {
    #[serde(default)]
    pub phase: IntegrationPhase,
    #[serde(default)]
    pub digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_kit: Option<KitReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<IntegrationCondition>,
}

impl IntegrationStatus {
    pub fn get_condition(&self, type_: IntegrationConditionType) -> Option<&IntegrationCondition> {
        self.conditions.iter().find(|c| c.type_ == type_)
    }

    pub fn set_condition(
        &mut self,
        type_: IntegrationConditionType,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.set_conditions([IntegrationCondition::new(type_, status, reason, message)]);
    }

    /// Sets each condition, replacing any existing condition of the same type.
    ///
    /// Conditions of other types are left untouched. The transition time is kept
    /// when the status does not change, and an identical condition is a no-op.
    pub fn set_conditions(&mut self, conditions: impl IntoIterator<Item = IntegrationCondition>) {
        let now = Utc::now();
        for mut condition in conditions {
            condition.last_update_time.get_or_insert(now);
            condition.last_transition_time.get_or_insert(now);

            match self.conditions.iter_mut().find(|c| c.type_ == condition.type_) {
                Some(current) if current.same_content(&condition) => {}
                Some(current) => {
                    if current.status == condition.status {
                        condition.last_transition_time = current.last_transition_time;
                    }
                    *current = condition;
                }
                None => self.conditions.push(condition),
            }
        }
    }

    pub fn remove_condition(&mut self, type_: IntegrationConditionType) {
        self.conditions.retain(|c| c.type_ != type_);
    }
}

/// Desired-state resource managed by the operator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Integration {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: IntegrationSpec,
    #[serde(default)]
    pub status: IntegrationStatus,
}

impl Integration {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta {
                name: Some(name.into()),
                namespace: Some(namespace.into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        self.metadata.name_or_empty()
    }

    pub fn namespace(&self) -> &str {
        self.metadata.namespace_or_empty()
    }

    pub fn operator_id(&self) -> Option<&str> {
        self.metadata.annotation(OPERATOR_ID_ANNOTATION)
    }

    pub fn integration_profile(&self) -> Option<&str> {
        self.metadata.annotation(INTEGRATION_PROFILE_ANNOTATION)
    }

    pub fn integration_profile_namespace(&self) -> Option<&str> {
        self.metadata.annotation(INTEGRATION_PROFILE_NAMESPACE_ANNOTATION)
    }

    /// Resets the status to its initial state.
    ///
    /// The profile is kept and so is the kit reference: clearing the kit is a
    /// separate decision taken by the caller.
    pub fn initialize(&mut self) {
        let profile = self
            .spec
            .profile
            .clone()
            .or_else(|| self.status.profile.take());
        let kit = self.status.integration_kit.take();
        self.status = IntegrationStatus {
            phase: IntegrationPhase::Initialization,
            profile,
            integration_kit: kit,
            ..Default::default()
        };
    }

    /// Points the Integration at `kit`, or clears the reference with `None`.
    pub fn set_integration_kit(&mut self, kit: Option<&IntegrationKit>) {
        let Some(kit) = kit else {
            self.status.integration_kit = None;
            return;
        };

        let (status, message) = if kit.status.phase == KitPhase::Ready {
            (ConditionStatus::True, kit.name().to_string())
        } else {
            (
                ConditionStatus::False,
                format!(
                    "integration kit {} is in state {:?}",
                    kit.name(),
                    kit.status.phase
                ),
            )
        };
        self.status.set_condition(
            IntegrationConditionType::KitAvailable,
            status,
            reason::KIT_AVAILABLE,
            message,
        );

        self.status.integration_kit = Some(kit.reference());
        if let Some(image) = kit.image() {
            self.status.image = Some(image.to_string());
        }
    }

    pub fn set_ready_condition(
        &mut self,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.status
            .set_condition(IntegrationConditionType::Ready, status, reason, message);
    }

    pub fn set_ready_condition_error(&mut self, message: impl Into<String>) {
        self.set_ready_condition(ConditionStatus::False, reason::ERROR, message);
    }

    pub fn is_condition_true(&self, type_: IntegrationConditionType) -> bool {
        self.status
            .get_condition(type_)
            .is_some_and(|c| c.status == ConditionStatus::True)
    }

    pub fn ready_condition(&self) -> Option<&IntegrationCondition> {
        self.status.get_condition(IntegrationConditionType::Ready)
    }
}
