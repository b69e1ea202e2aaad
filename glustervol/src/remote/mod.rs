//! Cluster-wide volume catalogue.
//!
//! When configured, the remote service is authoritative for which volumes
//! exist; the local mount table only knows what this process mounted.

use glustervol_shared::errors::VolumeResult;
use serde::{Deserialize, Serialize};

#[cfg(feature = "rest")]
mod rest;

#[cfg(feature = "rest")]
pub use rest::RestVolumeClient;

/// A volume as reported by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteVolume {
    pub name: String,
}

/// Remote volume management API.
///
/// Calls are synchronous. Implementations report their own failures;
/// the driver returns them to its caller unchanged.
pub trait RemoteVolumeService: Send + Sync {
    fn exists(&self, name: &str) -> VolumeResult<bool>;

    /// Create `name` with one brick per server.
    fn create(&self, name: &str, servers: &[String]) -> VolumeResult<()>;

    fn delete(&self, name: &str) -> VolumeResult<()>;

    fn list(&self) -> VolumeResult<Vec<RemoteVolume>>;
}
