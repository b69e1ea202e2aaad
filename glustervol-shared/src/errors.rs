//! Error types for volume lifecycle operations.
//!
//! Errors are grouped by where the failure originates:
//! - configuration: no remote service when one is required, bad startup flags
//! - state: volume in use, not mounted, not found, cleanup pending
//! - filesystem: mount path checks, directory creation/removal
//! - external command: non-zero exit from the mount/unmount client
//! - remote: passed through unchanged from the remote volume service

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the workspace.
pub type VolumeResult<T> = Result<T, VolumeError>;

#[derive(Debug, Error)]
pub enum VolumeError {
    /// The operation needs a remote volume service and none is configured.
    #[error("cannot {operation} volume {name}: no remote volume service configured")]
    NoRemoteService {
        operation: &'static str,
        name: String,
    },

    /// Volume has an active mount on this host.
    #[error("volume {0} is in use")]
    InUse(String),

    /// Unmount requested for a path this process never mounted.
    #[error("no volume mounted on {}", .path.display())]
    NotMounted { name: String, path: PathBuf },

    /// Volume unknown both locally and remotely.
    #[error("volume {0} not found")]
    NotFound(String),

    /// A previous unmount left the record half torn down.
    #[error("volume {name} on {} is pending cleanup ({stage})", .path.display())]
    CleanupPending {
        name: String,
        path: PathBuf,
        stage: String,
    },

    /// Something other than a directory sits at the mount path.
    #[error("{} already exists and is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// Filesystem operation on the mount path failed.
    #[error("{action} {}: {source}", .path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// External mount/unmount client failed or could not be spawned.
    #[error("{program} failed: {reason}")]
    Command { program: String, reason: String },

    /// Failure reported by the remote volume service.
    #[error("remote: {0}")]
    Remote(String),

    /// Volume name cannot be mapped to a child of the mount root.
    #[error("invalid volume name {0:?}")]
    InvalidName(String),

    /// Invalid startup configuration.
    #[error("config: {0}")]
    Config(String),

    /// Malformed plugin request.
    #[error("protocol: {0}")]
    Protocol(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = VolumeError::NoRemoteService {
            operation: "create",
            name: "data".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot create volume data: no remote volume service configured"
        );

        let err = VolumeError::NotADirectory(PathBuf::from("/mnt/v/data"));
        assert_eq!(
            err.to_string(),
            "/mnt/v/data already exists and is not a directory"
        );

        let err = VolumeError::NotMounted {
            name: "x".to_string(),
            path: PathBuf::from("/mnt/v/x"),
        };
        assert_eq!(err.to_string(), "no volume mounted on /mnt/v/x");
    }

    #[test]
    fn test_filesystem_error_keeps_source() {
        use std::error::Error as _;

        let err = VolumeError::Filesystem {
            action: "create directory",
            path: PathBuf::from("/mnt/v/data"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().starts_with("create directory /mnt/v/data: "));
        assert!(err.source().is_some());
    }
}
