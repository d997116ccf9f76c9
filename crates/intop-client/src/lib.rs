//! # intop-client
//!
//! Interfaces to the collaborators of the reconciliation core.
//!
//! This crate defines the traits the monitor and the trait pipeline use to read
//! platform state ([`PlatformClient`]) and to reach the workload's own health
//! endpoint ([`ProbeProxy`]). It ships an API-server backed probe proxy built
//! on `reqwest`, and in-memory implementations of both traits.
//!
//! ## Example
//!
//! ```ignore
//! use intop_client::{ClientError, ListOptions, PlatformClient};
//! use intop_core::LabelSelector;
//! use intop_core::labels::INTEGRATION_LABEL;
//!
//! async fn pods_of(client: &dyn PlatformClient, name: &str) -> Result<usize, ClientError> {
//!     let options = ListOptions::new()
//!         .with_labels(LabelSelector::new().with_label(INTEGRATION_LABEL, name));
//!     Ok(client.list_pods("default", &options).await?.len())
//! }
//! ```

pub mod apiserver;
mod error;
pub mod memory;
mod traits;

pub use apiserver::ApiServerProbeProxy;
pub use error::{ClientError, ProbeError};
pub use memory::{InMemoryPlatformClient, ScriptedProbeProxy};
pub use traits::{
    FIELD_STATUS_PHASE, ListOptions, ObjectKind, PlatformClient, ProbeProxy, ProbeRequest,
};

/// Type alias for a shared platform client.
pub type DynClient = std::sync::Arc<dyn PlatformClient>;

/// Type alias for a shared probe proxy.
pub type DynProbeProxy = std::sync::Arc<dyn ProbeProxy>;
