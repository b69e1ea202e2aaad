//! Configuration for the volume driver.
//!
//! Values are read once at startup and frozen into the driver; nothing here
//! changes for the lifetime of the process.

use std::path::{Path, PathBuf};

use glustervol_shared::constants::defaults;
use glustervol_shared::errors::{VolumeError, VolumeResult};
use serde::{Deserialize, Serialize};

/// Options for the external mount client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountOptions {
    /// Program invoked to attach a volume.
    ///
    /// Default: `glusterfs`
    #[serde(default = "default_mount_program")]
    pub mount_program: PathBuf,

    /// Program invoked to detach a volume.
    ///
    /// Default: `umount`
    #[serde(default = "default_unmount_program")]
    pub unmount_program: PathBuf,
}

fn default_mount_program() -> PathBuf {
    PathBuf::from(defaults::MOUNT_PROGRAM)
}

fn default_unmount_program() -> PathBuf {
    PathBuf::from(defaults::UNMOUNT_PROGRAM)
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            mount_program: default_mount_program(),
            unmount_program: default_unmount_program(),
        }
    }
}

/// Remote management API endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestOptions {
    /// Base URL of the glusterfs-rest service (e.g. `http://gluster-1:9000`).
    pub address: String,

    /// Directory on the cluster nodes where bricks are created.
    ///
    /// Default: /mnt/gfs
    #[serde(default = "default_gfs_base")]
    pub base: PathBuf,
}

fn default_gfs_base() -> PathBuf {
    PathBuf::from(defaults::GFS_BASE)
}

impl RestOptions {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            base: default_gfs_base(),
        }
    }
}

/// Driver configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverOptions {
    /// Local directory under which every mount path is derived.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// GlusterFS server endpoints passed to every mount.
    pub servers: Vec<String>,

    /// Remote management API. `None` runs the driver in local-only mode.
    #[serde(default)]
    pub rest: Option<RestOptions>,

    #[serde(default)]
    pub mount: MountOptions,
}

/// `/var/lib/docker-volumes/_glusterfs`
pub fn default_root() -> PathBuf {
    Path::new(defaults::DOCKER_VOLUME_ROOT).join(defaults::DRIVER_DIR)
}

impl DriverOptions {
    pub fn new(servers: Vec<String>) -> Self {
        Self {
            root: default_root(),
            servers,
            rest: None,
            mount: MountOptions::default(),
        }
    }

    /// Check the options before the driver is built.
    ///
    /// A missing server list is fatal: no volume could ever be mounted.
    pub fn validate(&self) -> VolumeResult<()> {
        if self.servers.is_empty() {
            return Err(VolumeError::Config("at least one server is required".into()));
        }
        if let Some(server) = self.servers.iter().find(|s| s.trim().is_empty()) {
            return Err(VolumeError::Config(format!(
                "invalid server entry {:?}",
                server
            )));
        }
        if self.root.as_os_str().is_empty() {
            return Err(VolumeError::Config("root directory must not be empty".into()));
        }
        if let Some(rest) = &self.rest
            && rest.address.trim().is_empty()
        {
            return Err(VolumeError::Config("rest address must not be empty".into()));
        }
        Ok(())
    }
}

/// Split a colon-delimited server list (`10.0.0.1:10.0.0.2`).
pub fn parse_server_list(raw: &str) -> VolumeResult<Vec<String>> {
    if raw.trim().is_empty() {
        return Err(VolumeError::Config("server list is empty".into()));
    }

    raw.split(defaults::SERVER_SEPARATOR)
        .map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                Err(VolumeError::Config(format!(
                    "server list {:?} contains an empty entry",
                    raw
                )))
            } else {
                Ok(entry.to_string())
            }
        })
        .collect()
}
