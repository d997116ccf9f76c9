//! Minimal model of a serving.knative.dev/v1 Service.
//!
//! Only the fields the operator reads or writes are modelled.

use k8s_openapi::api::core::v1::PodSpec;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

pub const KNATIVE_SERVICE_API_VERSION: &str = "serving.knative.dev/v1";
pub const KNATIVE_SERVICE_KIND: &str = "Service";
pub const SERVICE_CONDITION_READY: &str = "Ready";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionSpec {
    #[serde(flatten)]
    pub pod_spec: PodSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_concurrency: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionTemplateSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ObjectMeta>,
    #[serde(default)]
    pub spec: RevisionSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnativeServiceSpec {
    #[serde(default)]
    pub template: RevisionTemplateSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnativeCondition {
    #[serde(rename = "type")]
    pub type_: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnativeServiceStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<KnativeCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_ready_revision_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnativeService {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: KnativeServiceSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<KnativeServiceStatus>,
}

impl KnativeService {
    pub fn condition(&self, type_: &str) -> Option<&KnativeCondition> {
        self.status
            .as_ref()
            .and_then(|s| s.conditions.iter().find(|c| c.type_ == type_))
    }

    pub fn ready_condition(&self) -> Option<&KnativeCondition> {
        self.condition(SERVICE_CONDITION_READY)
    }

    pub fn is_ready(&self) -> bool {
        self.ready_condition().is_some_and(|c| c.status == "True")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_from_conditions() {
        let mut svc = KnativeService::default();
        assert!(!svc.is_ready());

        svc.status = Some(KnativeServiceStatus {
            conditions: vec![KnativeCondition {
                type_: SERVICE_CONDITION_READY.into(),
                status: "True".into(),
                ..Default::default()
            }],
            ..Default::default()
        });
        assert!(svc.is_ready());
    }

    #[test]
    fn test_revision_spec_flattens_pod_spec() {
        let json = serde_json::json!({
            "containers": [{"name": "integration", "image": "img"}],
            "containerConcurrency": 10
        });
        let spec: RevisionSpec = serde_json::from_value(json).unwrap();
        assert_eq!(spec.pod_spec.containers[0].name, "integration");
        assert_eq!(spec.container_concurrency, Some(10));
    }
}
