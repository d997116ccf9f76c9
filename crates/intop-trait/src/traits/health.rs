use k8s_openapi::api::core::v1::{Container, HTTPGetAction, Probe};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use crate::catalog::Trait;
use crate::environment::Environment;
use crate::error::TraitError;

pub(crate) const ID: &str = "health";

pub const DEFAULT_READINESS_PATH: &str = "/q/health/ready";

/// Declares the HTTP readiness probe of the integration container.
pub struct HealthTrait;

impl Trait for HealthTrait {
    fn id(&self) -> &'static str {
        ID
    }

    fn order(&self) -> u32 {
        1700
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &[super::container::ID]
    }

    fn applies_to(&self, env: &Environment<'_>) -> bool {
        let health = env.integration.spec.traits.health.as_ref();
        health.is_some_and(|h| h.enabled.unwrap_or(true))
            && env.is_trait_executed(super::container::ID)
    }

    fn apply(&self, env: &mut Environment<'_>) -> Result<(), TraitError> {
        let health = env.integration.spec.traits.health.clone().unwrap_or_default();
        if !health.readiness_probe_enabled.unwrap_or(true) {
            return Ok(());
        }

        let path = health
            .readiness_path
            .unwrap_or_else(|| DEFAULT_READINESS_PATH.to_string());
        let container_name = env.integration_container_name().to_string();

        env.resources.visit_pod_specs(|pod_spec| {
            let container = pod_spec
                .containers
                .iter_mut()
                .find(|c| c.name == container_name)
                .ok_or_else(|| {
                    TraitError::failed(ID, format!("unable to find integration container {container_name}"))
                })?;
            let port = probe_port(container)?;

            container.readiness_probe = Some(Probe {
                http_get: Some(HTTPGetAction {
                    path: Some(path.clone()),
                    port,
                    scheme: Some("HTTP".to_string()),
                    ..Default::default()
                }),
                timeout_seconds: health.readiness_timeout,
                period_seconds: health.readiness_period,
                failure_threshold: health.readiness_failure_threshold,
                ..Default::default()
            });
            Ok(())
        })
    }
}

/// Named port when the container declares one, its number otherwise.
fn probe_port(container: &Container) -> Result<IntOrString, TraitError> {
    let port = container
        .ports
        .as_ref()
        .and_then(|ports| ports.first())
        .ok_or_else(|| {
            TraitError::failed(ID, format!("container {} exposes no port", container.name))
        })?;
    Ok(match &port.name {
        Some(name) => IntOrString::String(name.clone()),
        None => IntOrString::Int(port.container_port),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{ContainerTrait, DeploymentTrait};
    use intop_core::integration::HealthTraitSpec;
    use intop_core::{Integration, IntegrationKit, IntegrationPlatform};

    #[test]
    fn test_readiness_probe_uses_named_port() {
        let mut it = Integration::new("default", "hello");
        it.spec.traits.health = Some(HealthTraitSpec {
            enabled: Some(true),
            readiness_timeout: Some(3),
            ..Default::default()
        });
        let mut kit = IntegrationKit::new("default", "kit");
        kit.status.image = Some("registry/kit:1".into());

        let mut env =
            Environment::from_parts(IntegrationPlatform::new("default", "intop"), kit, &mut it);
        DeploymentTrait.apply(&mut env).unwrap();
        ContainerTrait.apply(&mut env).unwrap();
        env.executed_traits.push("container".into());
        assert!(HealthTrait.applies_to(&env));
        HealthTrait.apply(&mut env).unwrap();

        let probe = env
            .resources
            .deployment()
            .and_then(|d| d.spec.as_ref())
            .and_then(|s| s.template.spec.as_ref())
            .and_then(|p| p.containers[0].readiness_probe.clone())
            .unwrap();
        let http_get = probe.http_get.unwrap();
        assert_eq!(http_get.path.as_deref(), Some(DEFAULT_READINESS_PATH));
        assert_eq!(http_get.port, IntOrString::String("http".into()));
        assert_eq!(probe.timeout_seconds, Some(3));
    }

    #[test]
    fn test_not_applied_without_configuration() {
        let mut it = Integration::new("default", "hello");
        let env = Environment::from_parts(
            IntegrationPlatform::new("default", "intop"),
            IntegrationKit::new("default", "kit"),
            &mut it,
        );
        assert!(!HealthTrait.applies_to(&env));
    }
}
