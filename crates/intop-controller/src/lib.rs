//! # intop-controller
//!
//! Reconciliation of deployed Integrations.
//!
//! [`MonitorAction`] is the step run on Integrations in the Deploying,
//! Running and Error phases. Each pass:
//!
//! 1. resets the Integration when its digest changed,
//! 2. switches to a higher priority ready kit when one exists,
//! 3. runs the trait pipeline to get the desired workload,
//! 4. resolves the [`WorkloadController`] of that workload,
//! 5. counts the Integration's pods and scans them for definitive failures,
//! 6. probes the readiness endpoint of pods that are not ready yet,
//! 7. decides the phase and the ready condition.
//!
//! The pass only mutates its copy of the Integration; persisting the returned
//! status is up to the caller.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use intop_client::{InMemoryPlatformClient, ScriptedProbeProxy};
//! use intop_controller::{Action, MonitorAction, load_config};
//! use intop_trait::TraitCatalog;
//!
//! let config = load_config(None)?;
//! let action = MonitorAction::new(
//!     Arc::new(InMemoryPlatformClient::new()),
//!     Arc::new(ScriptedProbeProxy::new()),
//!     Arc::new(TraitCatalog::new()),
//! )
//! .with_config(&config);
//!
//! if action.can_handle(&integration) {
//!     if let Some(updated) = action.handle(&integration).await? {
//!         // persist updated.status
//!     }
//! }
//! ```

pub mod action;
pub mod config;
pub mod controller;
pub mod error;
pub mod kits;
pub mod monitor;
pub mod observability;
pub mod pods;
pub mod readiness;

pub use action::Action;
pub use config::{LoggingConfig, OperatorConfig, OperatorSettings, ProbeConfig, load_config};
pub use controller::{
    CronJobController, DeploymentController, KnativeServiceController, WorkloadController,
    resolve_controller,
};
pub use error::{ErrorCategory, MonitorError};
pub use kits::{find_highest_priority_ready_kit, lookup_kits_for_integration};
pub use monitor::{
    MonitorAction, is_in_initialization_failed, is_in_integration_kit_failed,
    is_integration_kit_reset_required,
};
pub use pods::are_pods_failing_statuses;
pub use readiness::{ProbeOutcome, ReadinessProbe};
