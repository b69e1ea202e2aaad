//! Volume lifecycle management.
//!
//! [`VolumeDriver`] owns the mount table and serializes every operation that
//! touches it behind one lock, including the external mount/unmount calls
//! made while the table changes. Two calls for different volumes therefore
//! never run their table logic concurrently, and a path is physically mounted
//! at most once.
//!
//! Whether existence, creation, deletion and listing are answered locally or
//! by the cluster depends on a single switch: the optional
//! [`RemoteVolumeService`] given at construction.

mod dirs;
mod table;

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use glustervol_shared::errors::{VolumeError, VolumeResult};
use glustervol_shared::protocol::{Capability, Scope, VolumeInfo};
use parking_lot::Mutex;

use crate::mount::{GlusterfsMounter, MountExecutor};
use crate::options::DriverOptions;
use crate::remote::RemoteVolumeService;

pub use dirs::{LocalDirectories, MountDirectories};
pub use table::{CleanupStage, MountRecord, MountState};
use table::MountTable;

/// GlusterFS volume driver.
///
/// Shared between callers by reference (usually behind an `Arc`). Every
/// instance has its own table, so independent drivers can coexist.
pub struct VolumeDriver {
    root: PathBuf,
    servers: Vec<String>,
    mounter: Arc<dyn MountExecutor>,
    remote: Option<Arc<dyn RemoteVolumeService>>,
    dirs: Arc<dyn MountDirectories>,
    table: Mutex<MountTable>,
}

impl VolumeDriver {
    pub fn new(
        root: PathBuf,
        servers: Vec<String>,
        mounter: Arc<dyn MountExecutor>,
        remote: Option<Arc<dyn RemoteVolumeService>>,
    ) -> Self {
        Self {
            root,
            servers,
            mounter,
            remote,
            dirs: Arc::new(LocalDirectories),
            table: Mutex::new(MountTable::default()),
        }
    }

    /// Replace how mount directories are created and removed.
    pub fn with_directories(mut self, dirs: Arc<dyn MountDirectories>) -> Self {
        self.dirs = dirs;
        self
    }

    /// Build a driver backed by the `glusterfs` client and, when configured,
    /// the REST management API.
    ///
    /// # Errors
    ///
    /// Returns a config error if the options are invalid or a REST endpoint
    /// is configured in a build without the `rest` feature.
    pub fn from_options(options: DriverOptions) -> VolumeResult<Self> {
        options.validate()?;

        let mounter: Arc<dyn MountExecutor> = Arc::new(GlusterfsMounter::new(options.mount));
        let remote = match &options.rest {
            Some(rest) => Some(remote_client(rest)?),
            None => None,
        };

        tracing::info!(
            root = %options.root.display(),
            servers = ?options.servers,
            remote = remote.is_some(),
            "Volume driver configured"
        );

        Ok(Self::new(options.root, options.servers, mounter, remote))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Mount path for `name`: `root/name`. Pure derivation, no table access.
    ///
    /// `name` is resolved lexically beneath the root: separators at either
    /// end and `.` are dropped, and `..` never climbs above the root.
    pub fn path(&self, name: &str) -> PathBuf {
        let mut path = self.root.clone();
        let mut depth = 0usize;
        for component in Path::new(name).components() {
            match component {
                Component::Normal(part) => {
                    path.push(part);
                    depth += 1;
                }
                Component::ParentDir if depth > 0 => {
                    path.pop();
                    depth -= 1;
                }
                _ => {}
            }
        }
        path
    }

    /// Make sure volume `name` exists.
    ///
    /// A volume mounted by this process exists by definition. Otherwise the
    /// remote service is asked and the volume created there if missing.
    /// Local-only drivers cannot create volumes.
    pub fn create(&self, name: &str) -> VolumeResult<()> {
        validate_name(name)?;
        tracing::info!(volume = name, "Creating volume");

        let table = self.table.lock();
        if table.contains(&self.path(name)) {
            return Ok(());
        }

        match &self.remote {
            Some(remote) => {
                if remote.exists(name)? {
                    tracing::debug!(volume = name, "Volume already exists remotely");
                } else {
                    remote.create(name, &self.servers)?;
                    tracing::info!(volume = name, "Created remote volume");
                }
                Ok(())
            }
            None => Err(VolumeError::NoRemoteService {
                operation: "create",
                name: name.to_string(),
            }),
        }
    }

    /// Delete volume `name` on the remote service. Never forced: a volume
    /// with a mount table entry is refused.
    pub fn remove(&self, name: &str) -> VolumeResult<()> {
        validate_name(name)?;
        tracing::info!(volume = name, "Removing volume");

        let table = self.table.lock();
        let path = self.path(name);
        if let Some(record) = table.get(&path) {
            return Err(match record.state {
                MountState::Mounted => VolumeError::InUse(name.to_string()),
                MountState::PendingCleanup(stage) => VolumeError::CleanupPending {
                    name: name.to_string(),
                    path,
                    stage: stage.to_string(),
                },
            });
        }

        match &self.remote {
            Some(remote) => remote.delete(name),
            None => Err(VolumeError::NoRemoteService {
                operation: "remove",
                name: name.to_string(),
            }),
        }
    }

    /// Mount volume `name` and return its mount path.
    ///
    /// Already mounted volumes only gain a reference; the external client
    /// runs once per physical mount. On failure no record is added and a
    /// freshly created directory is left in place.
    pub fn mount(&self, name: &str) -> VolumeResult<PathBuf> {
        validate_name(name)?;

        let mut table = self.table.lock();
        let path = self.path(name);
        tracing::info!(volume = name, path = %path.display(), "Mounting volume");

        if let Some(record) = table.get_mut(&path) {
            match record.state {
                MountState::Mounted => {
                    record.reference_count += 1;
                    tracing::debug!(
                        volume = name,
                        references = record.reference_count,
                        "Volume already mounted"
                    );
                    return Ok(path);
                }
                MountState::PendingCleanup(CleanupStage::Unmount) => {
                    // Still attached from before the failed unmount.
                    record.reference_count = 1;
                    record.state = MountState::Mounted;
                    tracing::info!(volume = name, "Reattached volume pending cleanup");
                    return Ok(path);
                }
                MountState::PendingCleanup(CleanupStage::RemoveDir) => {}
            }
        }

        self.dirs.prepare(&path)?;
        self.mounter.mount(name, &self.servers, &path)?;
        table.insert(MountRecord::new(name, path.clone()));

        Ok(path)
    }

    /// Release one reference on volume `name`.
    ///
    /// The last reference unmounts the filesystem, removes the directory and
    /// drops the record. If either step fails the record stays in the table
    /// as [`MountState::PendingCleanup`]; the next unmount retries from the
    /// failed step.
    pub fn unmount(&self, name: &str) -> VolumeResult<()> {
        let mut table = self.table.lock();
        let path = self.path(name);
        tracing::info!(volume = name, path = %path.display(), "Unmounting volume");

        let stage = match table.get_mut(&path) {
            None => {
                return Err(VolumeError::NotMounted {
                    name: name.to_string(),
                    path,
                });
            }
            Some(record) => match record.state {
                MountState::Mounted => {
                    record.reference_count = record.reference_count.saturating_sub(1);
                    if record.reference_count > 0 {
                        tracing::debug!(
                            volume = name,
                            references = record.reference_count,
                            "Volume still in use"
                        );
                        return Ok(());
                    }
                    CleanupStage::Unmount
                }
                MountState::PendingCleanup(stage) => {
                    tracing::info!(volume = name, %stage, "Retrying cleanup");
                    stage
                }
            },
        };

        self.teardown(&mut table, &path, stage)
    }

    /// Describe volume `name`.
    ///
    /// Locally mounted volumes report their mount path; volumes known only
    /// to the remote service report just their name.
    pub fn get(&self, name: &str) -> VolumeResult<VolumeInfo> {
        let table = self.table.lock();
        let path = self.path(name);

        if let Some(record) = table.get(&path) {
            return Ok(VolumeInfo::mounted(
                record.volume_name.clone(),
                record.mount_path.clone(),
            ));
        }

        if let Some(remote) = &self.remote
            && remote.exists(name)?
        {
            return Ok(VolumeInfo::named(name));
        }

        Err(VolumeError::NotFound(name.to_string()))
    }

    /// List volumes.
    ///
    /// With a remote service this is exactly what the service reports (names
    /// only). Without one, it is the local mount table. The two are never
    /// merged.
    pub fn list(&self) -> VolumeResult<Vec<VolumeInfo>> {
        let table = self.table.lock();

        match &self.remote {
            Some(remote) => Ok(remote
                .list()?
                .into_iter()
                .map(|volume| VolumeInfo::named(volume.name))
                .collect()),
            None => Ok(table
                .records()
                .map(|record| {
                    VolumeInfo::mounted(record.volume_name.clone(), record.mount_path.clone())
                })
                .collect()),
        }
    }

    /// Volumes from this driver are reachable from any host in the cluster.
    pub fn capabilities(&self) -> Capability {
        Capability {
            scope: Scope::Global,
        }
    }

    /// Snapshot of the mount table entry for `name`.
    pub fn mounted(&self, name: &str) -> Option<MountRecord> {
        self.table.lock().get(&self.path(name)).cloned()
    }

    /// Snapshot of every mount table entry, ordered by path.
    pub fn records(&self) -> Vec<MountRecord> {
        self.table.lock().records().cloned().collect()
    }

    fn teardown(&self, table: &mut MountTable, path: &Path, from: CleanupStage) -> VolumeResult<()> {
        if from == CleanupStage::Unmount
            && let Err(e) = self.mounter.unmount(path)
        {
            table.mark_pending(path, CleanupStage::Unmount);
            return Err(e);
        }

        if let Err(e) = self.dirs.remove(path) {
            table.mark_pending(path, CleanupStage::RemoveDir);
            return Err(e);
        }

        table.remove(path);
        tracing::info!(path = %path.display(), "Volume released");
        Ok(())
    }
}

#[cfg(feature = "rest")]
fn remote_client(
    rest: &crate::options::RestOptions,
) -> VolumeResult<Arc<dyn RemoteVolumeService>> {
    Ok(Arc::new(crate::remote::RestVolumeClient::new(rest)?))
}

#[cfg(not(feature = "rest"))]
fn remote_client(
    rest: &crate::options::RestOptions,
) -> VolumeResult<Arc<dyn RemoteVolumeService>> {
    Err(VolumeError::Config(format!(
        "rest endpoint {} configured but built without rest support",
        rest.address
    )))
}

/// A volume name must map to exactly one child of the mount root.
fn validate_name(name: &str) -> VolumeResult<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains('/') => Ok(()),
        _ => Err(VolumeError::InvalidName(name.to_string())),
    }
}
