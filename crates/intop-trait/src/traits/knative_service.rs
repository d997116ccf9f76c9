use std::collections::BTreeMap;

use intop_core::WorkloadKind;
use intop_core::knative::{KnativeServiceSpec, RevisionTemplateSpec};
use intop_core::KnativeService;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::catalog::Trait;
use crate::collection::Resource;
use crate::environment::Environment;
use crate::error::TraitError;

pub(crate) const ID: &str = "knative-service";

const MIN_SCALE_ANNOTATION: &str = "autoscaling.knative.dev/minScale";
const MAX_SCALE_ANNOTATION: &str = "autoscaling.knative.dev/maxScale";

/// Materializes the Integration as a Knative Service.
pub struct KnativeServiceTrait;

impl Trait for KnativeServiceTrait {
    fn id(&self) -> &'static str {
        ID
    }

    fn order(&self) -> u32 {
        1400
    }

    fn applies_to(&self, env: &Environment<'_>) -> bool {
        env.controller_strategy() == WorkloadKind::KnativeService
    }

    fn apply(&self, env: &mut Environment<'_>) -> Result<(), TraitError> {
        let knative = env
            .integration
            .spec
            .traits
            .knative_service
            .clone()
            .unwrap_or_default();

        if let (Some(min), Some(max)) = (knative.min_scale, knative.max_scale) {
            if min > max {
                return Err(TraitError::failed(
                    ID,
                    format!("minScale {min} is greater than maxScale {max}"),
                ));
            }
        }

        let mut annotations = BTreeMap::new();
        if let Some(min) = knative.min_scale {
            annotations.insert(MIN_SCALE_ANNOTATION.to_string(), min.to_string());
        }
        if let Some(max) = knative.max_scale {
            annotations.insert(MAX_SCALE_ANNOTATION.to_string(), max.to_string());
        }

        let labels = env.integration_labels();
        let name = env.integration.name().to_string();
        let service = KnativeService {
            metadata: ObjectMeta {
                name: Some(name.clone()),
                namespace: Some(env.integration.namespace().to_string()),
                labels: Some(labels.clone()),
                ..Default::default()
            },
            spec: KnativeServiceSpec {
                template: RevisionTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(labels),
                        annotations: (!annotations.is_empty()).then_some(annotations),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            },
            status: None,
        };

        env.resources.add(Resource::KnativeService(Box::new(service)));
        env.set_workload_available(
            WorkloadKind::KnativeService,
            format!("Knative service name is {name}"),
        );
        Ok(())
    }
}
