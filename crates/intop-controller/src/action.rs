use async_trait::async_trait;
use intop_core::Integration;

use crate::error::MonitorError;

/// A reconciliation step for Integrations in a given set of phases.
#[async_trait]
pub trait Action: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this action handles `integration` in its current state.
    fn can_handle(&self, integration: &Integration) -> bool;

    /// Runs one pass.
    ///
    /// Returns the updated Integration, or `None` when nothing changed.
    /// The caller persists the returned status.
    async fn handle(&self, integration: &Integration) -> Result<Option<Integration>, MonitorError>;
}
