use intop_core::WorkloadKind;
use k8s_openapi::api::core::v1::{Container, ContainerPort, PodSpec};

use crate::catalog::Trait;
use crate::environment::Environment;
use crate::error::TraitError;
use crate::traits::WORKLOAD_TRAITS;

pub(crate) const ID: &str = "container";

pub const DEFAULT_CONTAINER_PORT: i32 = 8080;
pub const DEFAULT_CONTAINER_PORT_NAME: &str = "http";

/// Adds the integration container to every workload pod template.
pub struct ContainerTrait;

impl Trait for ContainerTrait {
    fn id(&self) -> &'static str {
        ID
    }

    fn order(&self) -> u32 {
        1600
    }

    fn depends_on(&self) -> &'static [&'static str] {
        WORKLOAD_TRAITS
    }

    fn applies_to(&self, env: &Environment<'_>) -> bool {
        !env.resources.is_empty()
    }

    fn apply(&self, env: &mut Environment<'_>) -> Result<(), TraitError> {
        let image = env
            .image()
            .ok_or_else(|| TraitError::failed(ID, "no image available for the integration"))?;
        let spec = env
            .integration
            .spec
            .traits
            .container
            .clone()
            .unwrap_or_default();

        // Cron jobs only expose a port when asked to.
        let port = match (spec.port, env.controller_strategy()) {
            (Some(port), _) => Some(port),
            (None, WorkloadKind::CronJob) => None,
            (None, _) => Some(DEFAULT_CONTAINER_PORT),
        };
        let ports = port.map(|port| {
            vec![ContainerPort {
                container_port: port,
                name: Some(
                    spec.port_name
                        .clone()
                        .unwrap_or_else(|| DEFAULT_CONTAINER_PORT_NAME.to_string()),
                ),
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }]
        });

        let container = Container {
            name: env.integration_container_name().to_string(),
            image: Some(image),
            ports,
            ..Default::default()
        };

        env.resources.visit_pod_specs(|pod_spec| {
            upsert_container(pod_spec, container.clone());
            Ok::<_, TraitError>(())
        })
    }
}

fn upsert_container(pod_spec: &mut PodSpec, container: Container) {
    match pod_spec
        .containers
        .iter_mut()
        .find(|c| c.name == container.name)
    {
        Some(existing) => *existing = container,
        None => pod_spec.containers.push(container),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{CronTrait, DeploymentTrait};
    use intop_core::integration::{ContainerTraitSpec, CronTraitSpec};
    use intop_core::{Integration, IntegrationKit, IntegrationPlatform};

    fn kit() -> IntegrationKit {
        let mut kit = IntegrationKit::new("default", "kit");
        kit.status.image = Some("registry/kit:1".into());
        kit
    }

    #[test]
    fn test_container_added_to_deployment() {
        let mut it = Integration::new("default", "hello");
        it.spec.traits.container = Some(ContainerTraitSpec {
            name: Some("main".into()),
            port: Some(9090),
            ..Default::default()
        });
        let mut env =
            Environment::from_parts(IntegrationPlatform::new("default", "intop"), kit(), &mut it);
        DeploymentTrait.apply(&mut env).unwrap();
        assert!(ContainerTrait.applies_to(&env));
        ContainerTrait.apply(&mut env).unwrap();
        // A second application replaces rather than duplicates.
        ContainerTrait.apply(&mut env).unwrap();

        let pod_spec = env
            .resources
            .deployment()
            .and_then(|d| d.spec.as_ref())
            .and_then(|s| s.template.spec.as_ref())
            .unwrap();
        assert_eq!(pod_spec.containers.len(), 1);
        let container = &pod_spec.containers[0];
        assert_eq!(container.name, "main");
        assert_eq!(container.image.as_deref(), Some("registry/kit:1"));
        assert_eq!(container.ports.as_ref().unwrap()[0].container_port, 9090);
    }

    #[test]
    fn test_cron_container_has_no_default_port() {
        let mut it = Integration::new("default", "ticker");
        it.spec.traits.cron = Some(CronTraitSpec {
            schedule: Some("0 * * * *".into()),
            ..Default::default()
        });
        let mut env =
            Environment::from_parts(IntegrationPlatform::new("default", "intop"), kit(), &mut it);
        CronTrait.apply(&mut env).unwrap();
        ContainerTrait.apply(&mut env).unwrap();

        let pod_spec = env
            .resources
            .cron_job()
            .and_then(|c| c.spec.as_ref())
            .and_then(|s| s.job_template.spec.as_ref())
            .and_then(|j| j.template.spec.as_ref())
            .unwrap();
        assert_eq!(pod_spec.containers[0].name, "integration");
        assert!(pod_spec.containers[0].ports.is_none());
    }

    #[test]
    fn test_missing_image_fails() {
        let mut it = Integration::new("default", "hello");
        let mut env = Environment::from_parts(
            IntegrationPlatform::new("default", "intop"),
            IntegrationKit::new("default", "kit"),
            &mut it,
        );
        DeploymentTrait.apply(&mut env).unwrap();
        assert!(ContainerTrait.apply(&mut env).is_err());
    }
}
