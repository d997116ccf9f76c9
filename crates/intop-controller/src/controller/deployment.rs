use async_trait::async_trait;
use intop_client::PlatformClient;
use intop_core::{ConditionStatus, Integration, IntegrationPhase, WorkloadKind, reason};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentCondition};
use k8s_openapi::api::core::v1::PodSpec;

use super::{WorkloadController, has_label};
use crate::error::MonitorError;

const PROGRESSING: &str = "Progressing";
const PROGRESS_DEADLINE_EXCEEDED: &str = "ProgressDeadlineExceeded";

pub struct DeploymentController {
    deployment: Deployment,
}

impl DeploymentController {
    pub fn new(deployment: Deployment) -> Self {
        Self { deployment }
    }

    fn condition(&self, type_: &str) -> Option<&DeploymentCondition> {
        self.deployment
            .status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .and_then(|conditions| conditions.iter().find(|c| c.type_ == type_))
    }

    fn desired_replicas(&self) -> i32 {
        self.deployment
            .spec
            .as_ref()
            .and_then(|s| s.replicas)
            .unwrap_or(1)
    }
}

#[async_trait]
impl WorkloadController for DeploymentController {
    fn kind(&self) -> WorkloadKind {
        WorkloadKind::Deployment
    }

    fn controller_name(&self) -> &'static str {
        "Deployment"
    }

    fn has_integration_label(&self) -> bool {
        has_label(
            self.deployment
                .spec
                .as_ref()
                .and_then(|s| s.template.metadata.as_ref()),
        )
    }

    fn pod_spec(&self) -> Option<&PodSpec> {
        self.deployment
            .spec
            .as_ref()
            .and_then(|s| s.template.spec.as_ref())
    }

    async fn check_ready_condition(
        &mut self,
        _client: &dyn PlatformClient,
        integration: &mut Integration,
    ) -> Result<bool, MonitorError> {
        let Some(progressing) = self.condition(PROGRESSING) else {
            return Ok(false);
        };
        if progressing.status == "False"
            && progressing.reason.as_deref() == Some(PROGRESS_DEADLINE_EXCEEDED)
        {
            integration.status.phase = IntegrationPhase::Error;
            integration.set_ready_condition_error(
                progressing.message.clone().unwrap_or_default(),
            );
            return Ok(true);
        }
        Ok(false)
    }

    fn update_ready_condition(&self, integration: &mut Integration, ready_pods: i32) -> bool {
        let replicas = self.desired_replicas();
        let updated = self
            .deployment
            .status
            .as_ref()
            .and_then(|s| s.updated_replicas)
            .unwrap_or_default();

        if ready_pods >= replicas {
            integration.set_ready_condition(
                ConditionStatus::True,
                reason::DEPLOYMENT_READY,
                format!("{ready_pods}/{replicas} ready replicas"),
            );
            return true;
        }

        let message = if updated < replicas {
            format!("{updated}/{replicas} updated replicas")
        } else {
            format!("{ready_pods}/{replicas} ready replicas")
        };
        integration.set_ready_condition(
            ConditionStatus::False,
            reason::DEPLOYMENT_PROGRESSING,
            message,
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intop_client::InMemoryPlatformClient;
    use k8s_openapi::api::apps::v1::{DeploymentSpec, DeploymentStatus};

    fn controller(replicas: Option<i32>, status: DeploymentStatus) -> DeploymentController {
        DeploymentController::new(Deployment {
            spec: Some(DeploymentSpec {
                replicas,
                ..Default::default()
            }),
            status: Some(status),
            ..Default::default()
        })
    }

    #[test]
    fn test_ready_when_enough_pods() {
        let c = controller(Some(2), DeploymentStatus {
            updated_replicas: Some(2),
            ..Default::default()
        });
        let mut it = Integration::new("default", "hello");

        assert!(!c.update_ready_condition(&mut it, 1));
        let ready = it.ready_condition().unwrap();
        assert_eq!(ready.reason, reason::DEPLOYMENT_PROGRESSING);
        assert_eq!(ready.message, "1/2 ready replicas");

        assert!(c.update_ready_condition(&mut it, 2));
        let ready = it.ready_condition().unwrap();
        assert_eq!(ready.status, ConditionStatus::True);
        assert_eq!(ready.reason, reason::DEPLOYMENT_READY);
    }

    #[test]
    fn test_rollout_in_progress() {
        let c = controller(None, DeploymentStatus::default());
        let mut it = Integration::new("default", "hello");
        assert!(!c.update_ready_condition(&mut it, 0));
        assert_eq!(it.ready_condition().unwrap().message, "0/1 updated replicas");
    }

    #[tokio::test]
    async fn test_progress_deadline_is_terminal() {
        let client = InMemoryPlatformClient::new();
        let mut c = controller(None, DeploymentStatus {
            conditions: Some(vec![DeploymentCondition {
                type_: PROGRESSING.into(),
                status: "False".into(),
                reason: Some(PROGRESS_DEADLINE_EXCEEDED.into()),
                message: Some("ReplicaSet \"hello-5d8\" has timed out progressing.".into()),
                ..Default::default()
            }]),
            ..Default::default()
        });
        let mut it = Integration::new("default", "hello");

        assert!(c.check_ready_condition(&client, &mut it).await.unwrap());
        assert_eq!(it.status.phase, IntegrationPhase::Error);
        assert_eq!(it.ready_condition().unwrap().reason, reason::ERROR);
    }
}
