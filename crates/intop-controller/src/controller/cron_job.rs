use async_trait::async_trait;
use intop_client::{ListOptions, PlatformClient};
use intop_core::labels::INTEGRATION_LABEL;
use intop_core::{
    ConditionStatus, Integration, IntegrationPhase, LabelSelector, MetaExt, WorkloadKind, reason,
};
use k8s_openapi::api::batch::v1::{CronJob, Job, JobCondition};
use k8s_openapi::api::core::v1::PodSpec;

use super::{WorkloadController, has_label};
use crate::error::MonitorError;

const JOB_COMPLETE: &str = "Complete";
const JOB_FAILED: &str = "Failed";

fn job_condition<'a>(job: &'a Job, type_: &str) -> Option<&'a JobCondition> {
    job.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .and_then(|conditions| conditions.iter().find(|c| c.type_ == type_))
}

fn is_active(job: &Job) -> bool {
    job.status
        .as_ref()
        .and_then(|s| s.active)
        .is_some_and(|active| active > 0)
}

/// CronJob readiness is derived from the job history, not from live pods.
pub struct CronJobController {
    cron_job: CronJob,
    last_completed_job: Option<Job>,
}

impl CronJobController {
    pub fn new(cron_job: CronJob) -> Self {
        Self {
            cron_job,
            last_completed_job: None,
        }
    }

    fn was_scheduled(&self) -> bool {
        self.cron_job
            .status
            .as_ref()
            .is_some_and(|s| s.last_schedule_time.is_some())
    }

    fn has_active_jobs(&self) -> bool {
        self.cron_job
            .status
            .as_ref()
            .and_then(|s| s.active.as_ref())
            .is_some_and(|active| !active.is_empty())
    }

    fn keeps_no_history(&self) -> bool {
        self.cron_job.spec.as_ref().is_some_and(|s| {
            s.successful_jobs_history_limit == Some(0) && s.failed_jobs_history_limit == Some(0)
        })
    }
}

#[async_trait]
impl WorkloadController for CronJobController {
    fn kind(&self) -> WorkloadKind {
        WorkloadKind::CronJob
    }

    fn controller_name(&self) -> &'static str {
        "CronJob"
    }

    fn has_integration_label(&self) -> bool {
        has_label(
            self.cron_job
                .spec
                .as_ref()
                .and_then(|s| s.job_template.spec.as_ref())
                .and_then(|s| s.template.metadata.as_ref()),
        )
    }

    fn pod_spec(&self) -> Option<&PodSpec> {
        self.cron_job
            .spec
            .as_ref()
            .and_then(|s| s.job_template.spec.as_ref())
            .and_then(|s| s.template.spec.as_ref())
    }

    async fn check_ready_condition(
        &mut self,
        client: &dyn PlatformClient,
        integration: &mut Integration,
    ) -> Result<bool, MonitorError> {
        if !self.was_scheduled() || self.has_active_jobs() {
            return Ok(false);
        }

        let options = ListOptions::new()
            .with_labels(LabelSelector::new().with_label(INTEGRATION_LABEL, integration.name()));
        let jobs = client.list_jobs(integration.namespace(), &options).await?;

        self.last_completed_job = jobs
            .into_iter()
            .filter(|job| !is_active(job))
            .max_by_key(|job| job.metadata.creation_timestamp.as_ref().map(|t| t.0));

        let Some(job) = &self.last_completed_job else {
            return Ok(false);
        };
        match job_condition(job, JOB_FAILED) {
            Some(failed) if failed.status == "True" => {
                integration.status.phase = IntegrationPhase::Error;
                integration.set_ready_condition(
                    ConditionStatus::False,
                    reason::LAST_JOB_FAILED,
                    format!(
                        "last job {} failed: {}",
                        job.metadata.name_or_empty(),
                        failed.message.as_deref().unwrap_or_default()
                    ),
                );
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn update_ready_condition(&self, integration: &mut Integration, _ready_pods: i32) -> bool {
        if !self.was_scheduled() {
            integration.set_ready_condition(
                ConditionStatus::True,
                reason::CRON_JOB_CREATED,
                "cronjob created",
            );
            return true;
        }
        if self.has_active_jobs() {
            integration.set_ready_condition(
                ConditionStatus::True,
                reason::CRON_JOB_ACTIVE,
                "cronjob active",
            );
            return true;
        }
        if self.keeps_no_history() {
            integration.set_ready_condition(
                ConditionStatus::True,
                reason::CRON_JOB_CREATED,
                "no jobs history available",
            );
            return true;
        }

        let succeeded = self.last_completed_job.as_ref().filter(|job| {
            job_condition(job, JOB_COMPLETE).is_some_and(|c| c.status == "True")
        });
        if let Some(job) = succeeded {
            let status = job.status.as_ref();
            let elapsed = status
                .and_then(|s| s.start_time.as_ref().zip(s.completion_time.as_ref()))
                .map(|(start, end)| (end.0 - start.0).num_seconds())
                .unwrap_or_default();
            integration.set_ready_condition(
                ConditionStatus::True,
                reason::LAST_JOB_SUCCEEDED,
                format!(
                    "last job {} completed successfully in {elapsed}s",
                    job.metadata.name_or_empty()
                ),
            );
            return true;
        }

        integration.set_ready_condition(ConditionStatus::Unknown, "", "");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use intop_client::InMemoryPlatformClient;
    use k8s_openapi::api::batch::v1::{CronJobSpec, CronJobStatus, JobStatus};
    use k8s_openapi::api::core::v1::ObjectReference;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};

    fn at(minute: u32) -> Time {
        Time(Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap())
    }

    fn scheduled(active: bool) -> CronJob {
        CronJob {
            spec: Some(CronJobSpec {
                schedule: "*/5 * * * *".into(),
                ..Default::default()
            }),
            status: Some(CronJobStatus {
                last_schedule_time: Some(at(10)),
                active: active.then(|| vec![ObjectReference::default()]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn job(name: &str, created: u32, condition: &str, message: &str) -> Job {
        Job {
            metadata: ObjectMeta {
                name: Some(name.into()),
                namespace: Some("default".into()),
                labels: Some([(INTEGRATION_LABEL.to_string(), "hello".to_string())].into()),
                creation_timestamp: Some(at(created)),
                ..Default::default()
            },
            status: Some(JobStatus {
                start_time: Some(at(created)),
                completion_time: Some(at(created + 1)),
                conditions: Some(vec![JobCondition {
                    type_: condition.into(),
                    status: "True".into(),
                    message: Some(message.into()),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_never_scheduled_is_ready() {
        let c = CronJobController::new(CronJob::default());
        let mut it = Integration::new("default", "hello");
        assert!(c.update_ready_condition(&mut it, 0));
        assert_eq!(it.ready_condition().unwrap().reason, reason::CRON_JOB_CREATED);
    }

    #[test]
    fn test_active_job_is_ready() {
        let c = CronJobController::new(scheduled(true));
        let mut it = Integration::new("default", "hello");
        assert!(c.update_ready_condition(&mut it, 0));
        assert_eq!(it.ready_condition().unwrap().reason, reason::CRON_JOB_ACTIVE);
    }

    #[tokio::test]
    async fn test_last_job_failed_is_terminal() {
        let client = InMemoryPlatformClient::new();
        client.add_job(job("hello-1", 0, JOB_COMPLETE, "")).await;
        client
            .add_job(job("hello-2", 5, JOB_FAILED, "BackoffLimitExceeded"))
            .await;

        let mut c = CronJobController::new(scheduled(false));
        let mut it = Integration::new("default", "hello");

        assert!(c.check_ready_condition(&client, &mut it).await.unwrap());
        assert_eq!(it.status.phase, IntegrationPhase::Error);
        let ready = it.ready_condition().unwrap();
        assert_eq!(ready.reason, reason::LAST_JOB_FAILED);
        assert_eq!(ready.message, "last job hello-2 failed: BackoffLimitExceeded");
    }

    #[tokio::test]
    async fn test_last_job_succeeded() {
        let client = InMemoryPlatformClient::new();
        client.add_job(job("hello-1", 5, JOB_COMPLETE, "")).await;

        let mut c = CronJobController::new(scheduled(false));
        let mut it = Integration::new("default", "hello");

        assert!(!c.check_ready_condition(&client, &mut it).await.unwrap());
        assert!(c.update_ready_condition(&mut it, 0));
        let ready = it.ready_condition().unwrap();
        assert_eq!(ready.reason, reason::LAST_JOB_SUCCEEDED);
        assert_eq!(ready.message, "last job hello-1 completed successfully in 60s");
    }

    #[test]
    fn test_unknown_without_history() {
        let c = CronJobController::new(scheduled(false));
        let mut it = Integration::new("default", "hello");
        assert!(!c.update_ready_condition(&mut it, 0));
        assert_eq!(it.ready_condition().unwrap().status, ConditionStatus::Unknown);
    }
}
