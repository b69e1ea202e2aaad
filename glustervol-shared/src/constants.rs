//! Shared constants between the driver library and the CLI.

/// Plugin protocol endpoints
pub mod endpoints {
    pub const ACTIVATE: &str = "/Plugin.Activate";
    pub const CREATE: &str = "/VolumeDriver.Create";
    pub const REMOVE: &str = "/VolumeDriver.Remove";
    pub const MOUNT: &str = "/VolumeDriver.Mount";
    pub const UNMOUNT: &str = "/VolumeDriver.Unmount";
    pub const PATH: &str = "/VolumeDriver.Path";
    pub const GET: &str = "/VolumeDriver.Get";
    pub const LIST: &str = "/VolumeDriver.List";
    pub const CAPABILITIES: &str = "/VolumeDriver.Capabilities";

    /// Interface name advertised on activation.
    pub const VOLUME_DRIVER: &str = "VolumeDriver";
}

/// Defaults for process configuration
pub mod defaults {
    /// Docker's plugin volume root; volumes live in a driver-specific child.
    pub const DOCKER_VOLUME_ROOT: &str = "/var/lib/docker-volumes";

    /// Child directory of [`DOCKER_VOLUME_ROOT`] owned by this driver.
    pub const DRIVER_DIR: &str = "_glusterfs";

    /// Base directory for bricks on the cluster side.
    pub const GFS_BASE: &str = "/mnt/gfs";

    /// Separator in the `--servers` flag.
    pub const SERVER_SEPARATOR: char = ':';

    pub const MOUNT_PROGRAM: &str = "glusterfs";
    pub const UNMOUNT_PROGRAM: &str = "umount";
}

/// Environment variables read by the CLI
pub mod envs {
    pub const SERVERS: &str = "GLUSTERVOL_SERVERS";
    pub const ROOT: &str = "GLUSTERVOL_ROOT";
    pub const REST: &str = "GLUSTERVOL_REST";
    pub const GFS_BASE: &str = "GLUSTERVOL_GFS_BASE";
}
