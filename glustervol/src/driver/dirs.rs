//! Mount point directories under the driver root.

use std::fs::{self, DirBuilder};
use std::io;
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;

use glustervol_shared::errors::{VolumeError, VolumeResult};

/// Mode for directories created under the mount root.
const MOUNT_DIR_MODE: u32 = 0o755;

/// Creates and removes the local directories volumes are mounted on.
pub trait MountDirectories: Send + Sync {
    /// Ensure `path` is a directory, creating it (and parents) when missing.
    fn prepare(&self, path: &Path) -> VolumeResult<()>;

    /// Remove `path` and everything below it. A missing path is not an error.
    fn remove(&self, path: &Path) -> VolumeResult<()>;
}

/// [`MountDirectories`] on the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalDirectories;

impl MountDirectories for LocalDirectories {
    fn prepare(&self, path: &Path) -> VolumeResult<()> {
        match fs::symlink_metadata(path) {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => Err(VolumeError::NotADirectory(path.to_path_buf())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => DirBuilder::new()
                .recursive(true)
                .mode(MOUNT_DIR_MODE)
                .create(path)
                .map_err(|source| VolumeError::Filesystem {
                    action: "create directory",
                    path: path.to_path_buf(),
                    source,
                }),
            Err(source) => Err(VolumeError::Filesystem {
                action: "inspect",
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn remove(&self, path: &Path) -> VolumeResult<()> {
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(VolumeError::Filesystem {
                action: "remove directory",
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}
