//! Built-in traits.

mod container;
mod cron;
mod deployment;
mod health;
mod knative_service;
mod mount;

pub use container::ContainerTrait;
pub use cron::CronTrait;
pub use deployment::DeploymentTrait;
pub use health::HealthTrait;
pub use knative_service::KnativeServiceTrait;
pub use mount::MountTrait;

use crate::catalog::Trait;

/// Built-in traits, already in execution order.
pub fn builtin() -> Vec<Box<dyn Trait>> {
    vec![
        Box::new(CronTrait),
        Box::new(DeploymentTrait),
        Box::new(KnativeServiceTrait),
        Box::new(ContainerTrait),
        Box::new(MountTrait),
        Box::new(HealthTrait),
    ]
}

/// Identifiers of the traits that produce the workload object.
pub(crate) const WORKLOAD_TRAITS: &[&str] = &[cron::ID, deployment::ID, knative_service::ID];
