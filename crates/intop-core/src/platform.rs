use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

use crate::meta::MetaExt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlatformPhase {
    #[default]
    #[serde(rename = "")]
    None,
    Creating,
    Warming,
    Ready,
    Error,
    Duplicate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterType {
    #[default]
    Kubernetes,
    OpenShift,
}

/// Trait profile the platform applies by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraitProfile {
    Kubernetes,
    Knative,
    OpenShift,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationPlatformSpec {
    #[serde(default)]
    pub cluster: ClusterType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<TraitProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationPlatformStatus {
    #[serde(default)]
    pub phase: PlatformPhase,
}

/// Operating environment registered for a namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrationPlatform {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: IntegrationPlatformSpec,
    #[serde(default)]
    pub status: IntegrationPlatformStatus,
}

impl IntegrationPlatform {
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

    pub fn is_ready(&self) -> bool {
        self.status.phase == PlatformPhase::Ready
    }
}

/// Picks the platform an Integration runs under among those of a namespace.
///
/// A ready platform wins; otherwise any platform that is not flagged as a
/// duplicate is used, so that integrations keep progressing while the
/// platform is warming up.
pub fn select_active_platform(platforms: &[IntegrationPlatform]) -> Option<&IntegrationPlatform> {
    platforms
        .iter()
        .find(|p| p.is_ready())
        .or_else(|| {
            platforms
                .iter()
                .find(|p| p.status.phase != PlatformPhase::Duplicate)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform(name: &str, phase: PlatformPhase) -> IntegrationPlatform {
        let mut p = IntegrationPlatform::new("default", name);
        p.status.phase = phase;
        p
    }

    #[test]
    fn test_ready_platform_wins() {
        let platforms = vec![
            platform("warming", PlatformPhase::Warming),
            platform("ready", PlatformPhase::Ready),
        ];
        assert_eq!(select_active_platform(&platforms).unwrap().name(), "ready");
    }

    #[test]
    fn test_duplicates_are_never_selected() {
        let platforms = vec![platform("dup", PlatformPhase::Duplicate)];
        assert!(select_active_platform(&platforms).is_none());
        assert!(select_active_platform(&[]).is_none());
    }
}
