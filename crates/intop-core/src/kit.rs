use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::integration::KitReference;
use crate::labels::{
    DEFAULT_KIT_PRIORITY, INTEGRATION_PROFILE_ANNOTATION,
    INTEGRATION_PROFILE_NAMESPACE_ANNOTATION, KIT_PRIORITY_LABEL, OPERATOR_ID_ANNOTATION,
};
use crate::meta::MetaExt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KitPhase {
    #[default]
    #[serde(rename = "")]
    None,
    Initialization,
    WaitingForPlatform,
    WaitingForCatalog,
    BuildSubmitted,
    BuildRunning,
    Ready,
    Error,
    CannotBuild,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationKitSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationKitStatus {
    #[serde(default)]
    pub phase: KitPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_provider: Option<String>,
}

/// Immutable build artifact an Integration runs from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrationKit {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: IntegrationKitSpec,
    #[serde(default)]
    pub status: IntegrationKitStatus,
}

impl IntegrationKit {
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

    pub fn reference(&self) -> KitReference {
        KitReference {
            name: self.name().to_string(),
            namespace: self.namespace().to_string(),
        }
    }

    /// Image built for this kit, preferring the one reported in status.
    pub fn image(&self) -> Option<&str> {
        self.status
            .image
            .as_deref()
            .or(self.spec.image.as_deref())
    }

    pub fn is_ready(&self) -> bool {
        self.status.phase == KitPhase::Ready
    }

    /// Raw priority label, defaulting to `"0"`.
    pub fn priority(&self) -> &str {
        self.metadata
            .label(KIT_PRIORITY_LABEL)
            .unwrap_or(DEFAULT_KIT_PRIORITY)
    }

    /// Priority label parsed as an integer. Malformed labels are an error.
    pub fn priority_value(&self) -> Result<i64> {
        let raw = self.priority();
        raw.parse::<i64>()
            .map_err(|_| CoreError::invalid_priority(self.name(), raw))
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
}
