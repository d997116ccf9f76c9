use intop_core::WorkloadKind;
use k8s_openapi::api::batch::v1::{CronJob, CronJobSpec, JobSpec, JobTemplateSpec};
use k8s_openapi::api::core::v1::{PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::catalog::Trait;
use crate::collection::Resource;
use crate::environment::Environment;
use crate::error::TraitError;

pub(crate) const ID: &str = "cron";

const DEFAULT_CONCURRENCY_POLICY: &str = "Forbid";

/// Materializes the Integration as a CronJob.
pub struct CronTrait;

impl Trait for CronTrait {
    fn id(&self) -> &'static str {
        ID
    }

    fn order(&self) -> u32 {
        1000
    }

    fn applies_to(&self, env: &Environment<'_>) -> bool {
        env.controller_strategy() == WorkloadKind::CronJob
    }

    fn apply(&self, env: &mut Environment<'_>) -> Result<(), TraitError> {
        let cron = env.integration.spec.traits.cron.clone().unwrap_or_default();
        let schedule = cron
            .schedule
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| TraitError::failed(ID, "a schedule is required"))?;

        let labels = env.integration_labels();
        let name = env.integration.name().to_string();
        let cron_job = CronJob {
            metadata: ObjectMeta {
                name: Some(name.clone()),
                namespace: Some(env.integration.namespace().to_string()),
                labels: Some(labels.clone()),
                ..Default::default()
            },
            spec: Some(CronJobSpec {
                schedule,
                concurrency_policy: Some(
                    cron.concurrency_policy
                        .unwrap_or_else(|| DEFAULT_CONCURRENCY_POLICY.to_string()),
                ),
                job_template: JobTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(labels.clone()),
                        ..Default::default()
                    }),
                    spec: Some(JobSpec {
                        backoff_limit: Some(0),
                        template: PodTemplateSpec {
                            metadata: Some(ObjectMeta {
                                labels: Some(labels),
                                ..Default::default()
                            }),
                            spec: Some(PodSpec {
                                restart_policy: Some("Never".to_string()),
                                ..Default::default()
                            }),
                        },
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            ..Default::default()
        };

        env.resources.add(Resource::CronJob(Box::new(cron_job)));
        env.set_workload_available(WorkloadKind::CronJob, format!("CronJob name is {name}"));
        Ok(())
    }
}
