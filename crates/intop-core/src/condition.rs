use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::PodCondition;
use serde::{Deserialize, Serialize};

use crate::health::HealthCheckResponse;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

impl ConditionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::True => "True",
            Self::False => "False",
            Self::Unknown => "Unknown",
        }
    }

    /// Parses the string form used by platform objects (`"True"`, `"False"`, ...).
    pub fn from_platform(value: &str) -> Self {
        match value {
            "True" => Self::True,
            "False" => Self::False,
            _ => Self::Unknown,
        }
    }
}

impl From<bool> for ConditionStatus {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

impl std::fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntegrationConditionType {
    Ready,
    #[serde(rename = "IntegrationKitAvailable")]
    KitAvailable,
    #[serde(rename = "IntegrationPlatformAvailable")]
    PlatformAvailable,
    DeploymentAvailable,
    KnativeServiceAvailable,
    CronJobAvailable,
}

/// Reasons attached to Integration conditions.
pub mod reason {
    pub const ERROR: &str = "Error";
    pub const INITIALIZATION_FAILED: &str = "InitializationFailed";
    pub const MONITORING_PODS_AVAILABLE: &str = "MonitoringPodsAvailable";
    pub const RUNTIME_NOT_READY: &str = "RuntimeNotReady";
    pub const KIT_AVAILABLE: &str = "IntegrationKitAvailable";
    pub const DEPLOYMENT_AVAILABLE: &str = "DeploymentAvailable";
    pub const DEPLOYMENT_READY: &str = "DeploymentReady";
    pub const DEPLOYMENT_PROGRESSING: &str = "DeploymentProgressing";
    pub const KNATIVE_SERVICE_AVAILABLE: &str = "KnativeServiceAvailable";
    pub const KNATIVE_SERVICE_READY: &str = "KnativeServiceReady";
    pub const CRON_JOB_AVAILABLE: &str = "CronJobAvailable";
    pub const CRON_JOB_CREATED: &str = "CronJobCreated";
    pub const CRON_JOB_ACTIVE: &str = "CronJobActive";
    pub const LAST_JOB_SUCCEEDED: &str = "LastJobSucceeded";
    pub const LAST_JOB_FAILED: &str = "LastJobFailed";
}

/// Per-pod detail recorded on the ready condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodConditionSnapshot {
    pub name: String,
    #[serde(default)]
    pub condition: PodCondition,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub health: Vec<HealthCheckResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationCondition {
    #[serde(rename = "type")]
    pub type_: IntegrationConditionType,
    pub status: ConditionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pods: Vec<PodConditionSnapshot>,
}

impl IntegrationCondition {
    pub fn new(
        type_: IntegrationConditionType,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            type_,
            status,
            last_update_time: None,
            last_transition_time: None,
            reason: reason.into(),
            message: message.into(),
            pods: Vec::new(),
        }
    }

    /// Same observable content, timestamps aside.
    pub fn same_content(&self, other: &IntegrationCondition) -> bool {
        self.type_ == other.type_
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
            && self.pods == other.pods
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_platform() {
        assert_eq!(ConditionStatus::from_platform("True"), ConditionStatus::True);
        assert_eq!(ConditionStatus::from_platform("False"), ConditionStatus::False);
        assert_eq!(ConditionStatus::from_platform("maybe"), ConditionStatus::Unknown);
        assert_eq!(ConditionStatus::from(true).to_string(), "True");
    }

    #[test]
    fn test_same_content_ignores_timestamps() {
        let a = IntegrationCondition::new(
            IntegrationConditionType::Ready,
            ConditionStatus::False,
            reason::ERROR,
            "boom",
        );
        let mut b = a.clone();
        b.last_transition_time = Some(Utc::now());
        assert!(a.same_content(&b));

        b.message = "other".into();
        assert!(!a.same_content(&b));
    }

    #[test]
    fn test_kit_condition_type_wire_name() {
        let json = serde_json::to_string(&IntegrationConditionType::KitAvailable).unwrap();
        assert_eq!(json, "\"IntegrationKitAvailable\"");
    }
}
