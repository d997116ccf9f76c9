//! Structured health report exposed by the integration runtime.
//!
//! A failing readiness endpoint answers `503 Service Unavailable` with a body
//! such as:
//!
//! ```json
//! {
//!   "status": "DOWN",
//!   "checks": [
//!     { "name": "routes", "status": "DOWN", "data": { "route.id": "route1" } }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthCheckStatus {
    Up,
    Down,
}

impl HealthCheckStatus {
    pub fn is_up(&self) -> bool {
        matches!(self, Self::Up)
    }
}

/// One named check of the health report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub name: String,
    pub status: HealthCheckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: HealthCheckStatus,
    #[serde(default)]
    pub checks: Vec<HealthCheckResponse>,
}

impl HealthCheck {
    pub fn parse(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(CoreError::InvalidHealthCheck)
    }

    /// Checks that are not reporting `UP`.
    pub fn failing_checks(&self) -> impl Iterator<Item = &HealthCheckResponse> {
        self.checks.iter().filter(|c| !c.status.is_up())
    }
}
