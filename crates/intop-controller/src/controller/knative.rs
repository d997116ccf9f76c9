use async_trait::async_trait;
use intop_client::PlatformClient;
use intop_core::{ConditionStatus, Integration, IntegrationPhase, KnativeService, WorkloadKind, reason};
use k8s_openapi::api::core::v1::PodSpec;

use super::{WorkloadController, has_label};
use crate::error::MonitorError;

const REVISION_FAILED: &str = "RevisionFailed";

pub struct KnativeServiceController {
    service: KnativeService,
}

impl KnativeServiceController {
    pub fn new(service: KnativeService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl WorkloadController for KnativeServiceController {
    fn kind(&self) -> WorkloadKind {
        WorkloadKind::KnativeService
    }

    fn controller_name(&self) -> &'static str {
        "Knative Service"
    }

    fn has_integration_label(&self) -> bool {
        has_label(self.service.spec.template.metadata.as_ref())
    }

    fn pod_spec(&self) -> Option<&PodSpec> {
        Some(&self.service.spec.template.spec.pod_spec)
    }

    async fn check_ready_condition(
        &mut self,
        _client: &dyn PlatformClient,
        integration: &mut Integration,
    ) -> Result<bool, MonitorError> {
        match self.service.ready_condition() {
            Some(ready)
                if ready.status == "False" && ready.reason.as_deref() == Some(REVISION_FAILED) =>
            {
                integration.status.phase = IntegrationPhase::Error;
                integration.set_ready_condition_error(ready.message.clone().unwrap_or_default());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn update_ready_condition(&self, integration: &mut Integration, _ready_pods: i32) -> bool {
        if self.service.is_ready() {
            integration.set_ready_condition(
                ConditionStatus::True,
                reason::KNATIVE_SERVICE_READY,
                "",
            );
            return true;
        }
        let ready = self.service.ready_condition();
        integration.set_ready_condition(
            ConditionStatus::False,
            ready.and_then(|c| c.reason.clone()).unwrap_or_default(),
            ready.and_then(|c| c.message.clone()).unwrap_or_default(),
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intop_client::InMemoryPlatformClient;
    use intop_core::knative::{KnativeCondition, KnativeServiceStatus, SERVICE_CONDITION_READY};

    fn service(status: &str, reason: Option<&str>, message: Option<&str>) -> KnativeServiceController {
        KnativeServiceController::new(KnativeService {
            status: Some(KnativeServiceStatus {
                conditions: vec![KnativeCondition {
                    type_: SERVICE_CONDITION_READY.into(),
                    status: status.into(),
                    reason: reason.map(Into::into),
                    message: message.map(Into::into),
                }],
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_revision_failed_is_terminal() {
        let client = InMemoryPlatformClient::new();
        let mut c = service("False", Some(REVISION_FAILED), Some("Revision \"hello-00001\" failed"));
        let mut it = Integration::new("default", "hello");

        assert!(c.check_ready_condition(&client, &mut it).await.unwrap());
        assert_eq!(it.status.phase, IntegrationPhase::Error);
        assert_eq!(it.ready_condition().unwrap().message, "Revision \"hello-00001\" failed");
    }

    #[test]
    fn test_ready_follows_service_condition() {
        let mut it = Integration::new("default", "hello");
        assert!(service("True", None, None).update_ready_condition(&mut it, 0));
        assert_eq!(it.ready_condition().unwrap().reason, reason::KNATIVE_SERVICE_READY);

        let c = service("Unknown", Some("RevisionMissing"), Some("waiting"));
        assert!(!c.update_ready_condition(&mut it, 0));
        let ready = it.ready_condition().unwrap();
        assert_eq!(ready.status, ConditionStatus::False);
        assert_eq!(ready.reason, "RevisionMissing");
    }
}
