//! GlusterFS volume lifecycle management.
//!
//! Tracks which named volumes are mounted on this host, attaches and detaches
//! them through the external `glusterfs` client, and optionally delegates
//! volume existence, creation and deletion to a cluster management service.
//!
//! # Overview
//!
//! - **VolumeDriver**: owns the mount table and serializes every operation
//! - **MountExecutor**: attaches/detaches a volume at a local path
//! - **RemoteVolumeService**: cluster-wide volume catalogue (optional)
//! - **PluginHandler**: maps plugin protocol requests onto driver operations

pub mod driver;
pub mod handler;
pub mod mount;
pub mod options;
pub mod remote;
pub mod util;

pub use driver::{
    CleanupStage, LocalDirectories, MountDirectories, MountRecord, MountState, VolumeDriver,
};
pub use glustervol_shared::errors::{VolumeError, VolumeResult};
pub use glustervol_shared::protocol::{Capability, Scope, VolumeInfo};
pub use handler::PluginHandler;
pub use mount::{GlusterfsMounter, MountExecutor};
pub use options::{DriverOptions, MountOptions, RestOptions};
pub use remote::{RemoteVolume, RemoteVolumeService};

#[cfg(feature = "rest")]
pub use remote::RestVolumeClient;
