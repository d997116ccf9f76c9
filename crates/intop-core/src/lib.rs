pub mod condition;
pub mod digest;
pub mod error;
pub mod health;
pub mod integration;
pub mod kit;
pub mod knative;
pub mod labels;
pub mod meta;
pub mod mount;
pub mod platform;

pub use condition::{
    ConditionStatus, IntegrationCondition, IntegrationConditionType, PodConditionSnapshot, reason,
};
pub use error::{CoreError, Result};
pub use health::{HealthCheck, HealthCheckResponse, HealthCheckStatus};
pub use integration::{
    Integration, IntegrationPhase, IntegrationSpec, IntegrationStatus, KitReference, Traits,
    WorkloadKind,
};
pub use kit::{IntegrationKit, KitPhase};
pub use knative::KnativeService;
pub use labels::{LabelSelector, Requirement};
pub use meta::MetaExt;
pub use mount::{MountResource, StorageType};
pub use platform::{IntegrationPlatform, PlatformPhase, TraitProfile, select_active_platform};
