//! # intop-trait
//!
//! The trait pipeline: an ordered catalog of transformations that turns an
//! Integration, its kit and the namespace's platform into the desired
//! workload objects.
//!
//! ## Architecture
//!
//! - [`Environment`] is the per-pass context. It is built fresh each pass and
//!   owns the [`ResourceCollection`] the traits append to.
//! - [`Trait`] is the capability every transformation implements.
//! - [`TraitCatalog`] holds the traits in dependency order. It is immutable and
//!   meant to be built once per process and shared.
//!
//! The pipeline is idempotent: applying it twice to the same inputs yields the
//! same collection.

pub mod catalog;
pub mod collection;
pub mod environment;
pub mod error;
pub mod traits;

pub use catalog::{Trait, TraitCatalog};
pub use collection::{Resource, ResourceCollection};
pub use environment::{DEFAULT_CONTAINER_NAME, Environment, integration_container_name};
pub use error::TraitError;

use intop_client::PlatformClient;
use intop_core::{Integration, IntegrationKit};

/// Runs `catalog` against `integration` and returns the desired objects.
///
/// `kit` is resolved from the Integration's kit reference when not given.
/// Conditions set by the traits are written to `integration`.
pub async fn apply(
    client: &dyn PlatformClient,
    catalog: &TraitCatalog,
    integration: &mut Integration,
    kit: Option<IntegrationKit>,
) -> Result<ResourceCollection, TraitError> {
    let mut env = Environment::new(client, integration, kit).await?;
    catalog.apply(&mut env)?;

    tracing::debug!(
        integration = %env.integration.name(),
        traits = ?env.executed_traits,
        resources = env.resources.len(),
        "Trait pipeline applied"
    );

    Ok(env.resources)
}
