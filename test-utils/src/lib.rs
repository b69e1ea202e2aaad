//! Test doubles for the mount client, mount directories and the remote
//! volume service.
//!
//! The fakes record every call so tests can assert how often the external
//! side was touched, and each can be switched into a failing mode.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use glustervol::{
    LocalDirectories, MountDirectories, MountExecutor, RemoteVolume, RemoteVolumeService,
    VolumeDriver,
};
use glustervol_shared::errors::{VolumeError, VolumeResult};
use parking_lot::Mutex;
use tempfile::TempDir;

/// Servers every test driver is configured with.
pub const TEST_SERVERS: &[&str] = &["10.0.0.1", "10.0.0.2"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountCall {
    Mount {
        volume: String,
        servers: Vec<String>,
        destination: PathBuf,
    },
    Unmount {
        destination: PathBuf,
    },
}

#[derive(Debug, Default)]
struct MounterState {
    calls: Vec<MountCall>,
    fail_mount: bool,
    fail_unmount: bool,
    delay: Option<Duration>,
}

/// [`MountExecutor`] that records calls instead of running `glusterfs`.
#[derive(Debug, Default)]
pub struct RecordingMounter {
    state: Mutex<MounterState>,
}

impl RecordingMounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<MountCall> {
        self.state.lock().calls.clone()
    }

    pub fn mount_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, MountCall::Mount { .. }))
            .count()
    }

    pub fn unmount_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, MountCall::Unmount { .. }))
            .count()
    }

    pub fn fail_mounts(&self, fail: bool) {
        self.state.lock().fail_mount = fail;
    }

    pub fn fail_unmounts(&self, fail: bool) {
        self.state.lock().fail_unmount = fail;
    }

    /// Sleep this long inside every call, to widen race windows.
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().delay = Some(delay);
    }

    /// Record `call`; returns (should fail, delay).
    fn record(&self, call: MountCall) -> (bool, Option<Duration>) {
        let mut state = self.state.lock();
        let fail = match call {
            MountCall::Mount { .. } => state.fail_mount,
            MountCall::Unmount { .. } => state.fail_unmount,
        };
        state.calls.push(call);
        (fail, state.delay)
    }
}

impl MountExecutor for RecordingMounter {
    fn mount(&self, volume: &str, servers: &[String], destination: &Path) -> VolumeResult<()> {
        let (fail, delay) = self.record(MountCall::Mount {
            volume: volume.to_string(),
            servers: servers.to_vec(),
            destination: destination.to_path_buf(),
        });
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        if fail {
            return Err(VolumeError::Command {
                program: "glusterfs".into(),
                reason: "exited with exit status: 1".into(),
            });
        }
        Ok(())
    }

    fn unmount(&self, destination: &Path) -> VolumeResult<()> {
        let (fail, delay) = self.record(MountCall::Unmount {
            destination: destination.to_path_buf(),
        });
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        if fail {
            return Err(VolumeError::Command {
                program: "umount".into(),
                reason: "exited with exit status: 32".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct DirectoryState {
    removals: Vec<PathBuf>,
    fail_removal: bool,
}

/// [`MountDirectories`] on the real filesystem whose removals can be made
/// to fail regardless of the caller's privileges.
#[derive(Debug, Default)]
pub struct RecordingDirectories {
    state: Mutex<DirectoryState>,
}

impl RecordingDirectories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every path removal was attempted on, failed or not.
    pub fn removals(&self) -> Vec<PathBuf> {
        self.state.lock().removals.clone()
    }

    /// While set, removals leave the directory in place and fail.
    pub fn fail_removals(&self, fail: bool) {
        self.state.lock().fail_removal = fail;
    }
}

impl MountDirectories for RecordingDirectories {
    fn prepare(&self, path: &Path) -> VolumeResult<()> {
        LocalDirectories.prepare(path)
    }

    fn remove(&self, path: &Path) -> VolumeResult<()> {
        let fail = {
            let mut state = self.state.lock();
            state.removals.push(path.to_path_buf());
            state.fail_removal
        };
        if fail {
            return Err(VolumeError::Filesystem {
                action: "remove directory",
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::ResourceBusy, "directory is busy"),
            });
        }
        LocalDirectories.remove(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Exists(String),
    Create(String, Vec<String>),
    Delete(String),
    List,
}

#[derive(Debug, Default)]
struct RemoteState {
    volumes: BTreeSet<String>,
    calls: Vec<RemoteCall>,
    failure: Option<String>,
}

/// In-memory [`RemoteVolumeService`].
#[derive(Debug, Default)]
pub struct FakeRemote {
    state: Mutex<RemoteState>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_volumes(names: &[&str]) -> Self {
        let remote = Self::default();
        remote
            .state
            .lock()
            .volumes
            .extend(names.iter().map(|n| n.to_string()));
        remote
    }

    pub fn volumes(&self) -> Vec<String> {
        self.state.lock().volumes.iter().cloned().collect()
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state.lock().calls.clone()
    }

    pub fn create_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, RemoteCall::Create(..)))
            .count()
    }

    /// Make every subsequent call fail with `message`.
    pub fn fail_with(&self, message: &str) {
        self.state.lock().failure = Some(message.to_string());
    }

    fn record(&self, call: RemoteCall) -> VolumeResult<parking_lot::MutexGuard<'_, RemoteState>> {
        let mut state = self.state.lock();
        state.calls.push(call);
        if let Some(message) = state.failure.clone() {
            return Err(VolumeError::Remote(message));
        }
        Ok(state)
    }
}

impl RemoteVolumeService for FakeRemote {
    fn exists(&self, name: &str) -> VolumeResult<bool> {
        let state = self.record(RemoteCall::Exists(name.to_string()))?;
        Ok(state.volumes.contains(name))
    }

    fn create(&self, name: &str, servers: &[String]) -> VolumeResult<()> {
        let mut state = self.record(RemoteCall::Create(name.to_string(), servers.to_vec()))?;
        state.volumes.insert(name.to_string());
        Ok(())
    }

    fn delete(&self, name: &str) -> VolumeResult<()> {
        let mut state = self.record(RemoteCall::Delete(name.to_string()))?;
        if !state.volumes.remove(name) {
            return Err(VolumeError::Remote(format!("volume {} does not exist", name)));
        }
        Ok(())
    }

    fn list(&self) -> VolumeResult<Vec<RemoteVolume>> {
        let state = self.record(RemoteCall::List)?;
        Ok(state
            .volumes
            .iter()
            .map(|name| RemoteVolume { name: name.clone() })
            .collect())
    }
}

/// Driver wired to fakes, rooted in a temporary directory.
pub struct TestDriver {
    pub driver: Arc<VolumeDriver>,
    pub mounter: Arc<RecordingMounter>,
    pub dirs: Arc<RecordingDirectories>,
    pub remote: Option<Arc<FakeRemote>>,
    _temp_dir: TempDir,
}

impl TestDriver {
    /// Local-only driver.
    pub fn local() -> Self {
        Self::build(None)
    }

    /// Driver backed by `remote`.
    pub fn with_remote(remote: FakeRemote) -> Self {
        Self::build(Some(Arc::new(remote)))
    }

    fn build(remote: Option<Arc<FakeRemote>>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mounter = Arc::new(RecordingMounter::new());
        let dirs = Arc::new(RecordingDirectories::new());
        let driver = VolumeDriver::new(
            temp_dir.path().join("volumes"),
            servers(),
            mounter.clone(),
            remote
                .clone()
                .map(|r| r as Arc<dyn RemoteVolumeService>),
        )
        .with_directories(dirs.clone());

        Self {
            driver: Arc::new(driver),
            mounter,
            dirs,
            remote,
            _temp_dir: temp_dir,
        }
    }

    pub fn remote(&self) -> &FakeRemote {
        self.remote.as_deref().expect("driver has no remote service")
    }
}

pub fn servers() -> Vec<String> {
    TEST_SERVERS.iter().map(|s| s.to_string()).collect()
}
