use intop_core::WorkloadKind;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};

use crate::catalog::Trait;
use crate::collection::Resource;
use crate::environment::Environment;
use crate::error::TraitError;

pub(crate) const ID: &str = "deployment";

const PROGRESS_DEADLINE_SECONDS: i32 = 60;

/// Materializes the Integration as a Deployment.
pub struct DeploymentTrait;

impl Trait for DeploymentTrait {
    fn id(&self) -> &'static str {
        ID
    }

    fn order(&self) -> u32 {
        1100
    }

    fn applies_to(&self, env: &Environment<'_>) -> bool {
        env.controller_strategy() == WorkloadKind::Deployment
    }

    fn apply(&self, env: &mut Environment<'_>) -> Result<(), TraitError> {
        let labels = env.integration_labels();
        let name = env.integration.name().to_string();

        let deployment = Deployment {
            metadata: ObjectMeta {
                name: Some(name.clone()),
                namespace: Some(env.integration.namespace().to_string()),
                labels: Some(labels.clone()),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas: env.integration.spec.replicas,
                progress_deadline_seconds: Some(PROGRESS_DEADLINE_SECONDS),
                selector: LabelSelector {
                    match_labels: Some(labels.clone()),
                    ..Default::default()
                },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(labels),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec::default()),
                },
                ..Default::default()
            }),
            ..Default::default()
        };

        env.resources.add(Resource::Deployment(Box::new(deployment)));
        env.set_workload_available(
            WorkloadKind::Deployment,
            format!("deployment name is {name}"),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intop_core::{Integration, IntegrationConditionType, IntegrationKit, IntegrationPlatform};

    #[test]
    fn test_deployment_follows_replicas() {
        let mut it = Integration::new("default", "hello");
        it.spec.replicas = Some(3);
        let mut env = Environment::from_parts(
            IntegrationPlatform::new("default", "intop"),
            IntegrationKit::new("default", "kit"),
            &mut it,
        );
        assert!(DeploymentTrait.applies_to(&env));
        DeploymentTrait.apply(&mut env).unwrap();

        let spec = env.resources.deployment().and_then(|d| d.spec.as_ref()).unwrap();
        assert_eq!(spec.replicas, Some(3));
        assert_eq!(spec.selector.match_labels, spec.template.metadata.as_ref().unwrap().labels);

        assert!(it.is_condition_true(IntegrationConditionType::DeploymentAvailable));
    }
}
