//! Content digest used to detect Integration drift.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::integration::Integration;

/// Bumped whenever the digest layout changes, forcing a reset of every Integration.
const DIGEST_VERSION: &str = "1";

/// Computes the digest of an Integration spec and the resource versions of the
/// configmaps and secrets it watches.
///
/// Resource versions are sorted before hashing, so the listing order of the
/// watched objects does not affect the result.
pub fn compute_for_integration(
    integration: &Integration,
    configmap_versions: &[String],
    secret_versions: &[String],
) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(DIGEST_VERSION.as_bytes());
    hasher.update(serde_json::to_vec(&integration.spec)?);

    let mut configmaps: Vec<&String> = configmap_versions.iter().collect();
    configmaps.sort();
    for version in configmaps {
        hasher.update(b"configmap:");
        hasher.update(version.as_bytes());
    }

    let mut secrets: Vec<&String> = secret_versions.iter().collect();
    secrets.sort();
    for version in secrets {
        hasher.update(b"secret:");
        hasher.update(version.as_bytes());
    }

    Ok(format!("v{}", URL_SAFE_NO_PAD.encode(hasher.finalize())))
}
