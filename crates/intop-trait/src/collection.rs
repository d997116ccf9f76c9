//! Desired objects produced by one pipeline pass.

use intop_core::{KnativeService, MetaExt};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::{PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// A desired workload object.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Deployment(Box<Deployment>),
    KnativeService(Box<KnativeService>),
    CronJob(Box<CronJob>),
}

impl Resource {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Deployment(_) => "Deployment",
            Self::KnativeService(_) => "Service",
            Self::CronJob(_) => "CronJob",
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Self::Deployment(d) => &d.metadata,
            Self::KnativeService(s) => &s.metadata,
            Self::CronJob(c) => &c.metadata,
        }
    }

    pub fn name(&self) -> &str {
        self.metadata().name_or_empty()
    }

    /// Pod template of the workload, if it has one yet.
    pub fn pod_template_mut(&mut self) -> Option<(&mut Option<ObjectMeta>, &mut PodSpec)> {
        match self {
            Self::Deployment(d) => d
                .spec
                .as_mut()
                .and_then(|spec| template_parts(&mut spec.template)),
            Self::KnativeService(s) => {
                let template = &mut s.spec.template;
                Some((&mut template.metadata, &mut template.spec.pod_spec))
            }
            Self::CronJob(c) => c
                .spec
                .as_mut()
                .and_then(|spec| spec.job_template.spec.as_mut())
                .and_then(|job| template_parts(&mut job.template)),
        }
    }
}

fn template_parts(template: &mut PodTemplateSpec) -> Option<(&mut Option<ObjectMeta>, &mut PodSpec)> {
    let PodTemplateSpec { metadata, spec } = template;
    spec.as_mut().map(|spec| (metadata, spec))
}

/// Ordered, append-only list of desired objects.
///
/// Later traits see and may amend what earlier traits produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceCollection {
    items: Vec<Resource>,
}

impl ResourceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, resource: Resource) {
        self.items.push(resource);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Resource] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Resource> {
        self.items
    }

    pub fn deployment(&self) -> Option<&Deployment> {
        self.items.iter().find_map(|r| match r {
            Resource::Deployment(d) => Some(d.as_ref()),
            _ => None,
        })
    }

    pub fn knative_service(&self) -> Option<&KnativeService> {
        self.items.iter().find_map(|r| match r {
            Resource::KnativeService(s) => Some(s.as_ref()),
            _ => None,
        })
    }

    pub fn cron_job(&self) -> Option<&CronJob> {
        self.items.iter().find_map(|r| match r {
            Resource::CronJob(c) => Some(c.as_ref()),
            _ => None,
        })
    }

    /// Calls `visitor` on the pod template of every workload in insertion order.
    pub fn visit_pod_templates<F, E>(&mut self, mut visitor: F) -> Result<(), E>
    where
        F: FnMut(&mut Option<ObjectMeta>, &mut PodSpec) -> Result<(), E>,
    {
        for resource in &mut self.items {
            if let Some((metadata, spec)) = resource.pod_template_mut() {
                visitor(metadata, spec)?;
            }
        }
        Ok(())
    }

    /// Like [`visit_pod_templates`](Self::visit_pod_templates) for the pod spec only.
    pub fn visit_pod_specs<F, E>(&mut self, mut visitor: F) -> Result<(), E>
    where
        F: FnMut(&mut PodSpec) -> Result<(), E>,
    {
        self.visit_pod_templates(|_, spec| visitor(spec))
    }
}

impl<'a> IntoIterator for &'a ResourceCollection {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::DeploymentSpec;
    use k8s_openapi::api::core::v1::Container;

    fn deployment(name: &str) -> Resource {
        Resource::Deployment(Box::new(Deployment {
            metadata: ObjectMeta {
                name: Some(name.into()),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                template: PodTemplateSpec {
                    metadata: None,
                    spec: Some(PodSpec::default()),
                },
                ..Default::default()
            }),
            ..Default::default()
        }))
    }

    #[test]
    fn test_typed_lookup() {
        let mut resources = ResourceCollection::new();
        assert!(resources.deployment().is_none());

        resources.add(deployment("hello"));
        assert_eq!(resources.len(), 1);
        assert_eq!(
            resources.deployment().and_then(|d| d.metadata.name.as_deref()),
            Some("hello")
        );
        assert!(resources.cron_job().is_none());
        assert!(resources.knative_service().is_none());
    }

    #[test]
    fn test_visit_pod_specs() {
        let mut resources = ResourceCollection::new();
        resources.add(deployment("a"));
        resources.add(Resource::KnativeService(Box::default()));

        resources
            .visit_pod_specs(|spec| {
                spec.containers.push(Container {
                    name: "integration".into(),
                    ..Default::default()
                });
                Ok::<_, ()>(())
            })
            .unwrap();

        let containers = |r: &Resource| match r {
            Resource::Deployment(d) => d
                .spec
                .as_ref()
                .and_then(|s| s.template.spec.as_ref())
                .map(|s| s.containers.len()),
            Resource::KnativeService(s) => Some(s.spec.template.spec.pod_spec.containers.len()),
            Resource::CronJob(_) => None,
        };
        assert!(resources.iter().all(|r| containers(r) == Some(1)));
    }
}
