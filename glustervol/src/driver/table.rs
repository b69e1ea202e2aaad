//! Mount table: mount path → record of the volume mounted there.
//!
//! In-memory only. A fresh process starts with an empty table even if
//! volumes from a previous run are still mounted on disk.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Step of the teardown that failed after the last unmount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CleanupStage {
    /// The external unmount failed; the filesystem is still attached.
    Unmount,
    /// Unmounted, but the mount directory could not be removed.
    RemoveDir,
}

impl fmt::Display for CleanupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupStage::Unmount => f.write_str("unmount"),
            CleanupStage::RemoveDir => f.write_str("remove directory"),
        }
    }
}

/// State of a mount table entry.
///
/// ```text
/// mount()          → Mounted (count 1)
/// mount()/unmount()→ Mounted (count ± 1)
/// last unmount()   → removed, or PendingCleanup(stage) if teardown failed
/// unmount()        → PendingCleanup retries teardown from `stage`
/// mount()          → PendingCleanup(Unmount) reattaches, (RemoveDir) remounts
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MountState {
    Mounted,
    PendingCleanup(CleanupStage),
}

/// One volume mounted by this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRecord {
    pub volume_name: String,
    pub mount_path: PathBuf,
    /// Outstanding mount requests. At least 1 while `Mounted`, 0 while
    /// pending cleanup.
    pub reference_count: u32,
    pub state: MountState,
}

impl MountRecord {
    pub(crate) fn new(volume_name: &str, mount_path: PathBuf) -> Self {
        Self {
            volume_name: volume_name.to_string(),
            mount_path,
            reference_count: 1,
            state: MountState::Mounted,
        }
    }
}

/// Keyed by mount path; ordered so listings are stable.
#[derive(Debug, Default)]
pub(crate) struct MountTable {
    records: BTreeMap<PathBuf, MountRecord>,
}

impl MountTable {
    pub(crate) fn get(&self, path: &Path) -> Option<&MountRecord> {
        self.records.get(path)
    }

    pub(crate) fn get_mut(&mut self, path: &Path) -> Option<&mut MountRecord> {
        self.records.get_mut(path)
    }

    pub(crate) fn contains(&self, path: &Path) -> bool {
        self.records.contains_key(path)
    }

    /// Insert or replace the record at its mount path.
    pub(crate) fn insert(&mut self, record: MountRecord) {
        self.records.insert(record.mount_path.clone(), record);
    }

    pub(crate) fn remove(&mut self, path: &Path) -> Option<MountRecord> {
        self.records.remove(path)
    }

    /// Flag the record at `path` as half torn down.
    pub(crate) fn mark_pending(&mut self, path: &Path, stage: CleanupStage) {
        if let Some(record) = self.records.get_mut(path) {
            record.reference_count = 0;
            record.state = MountState::PendingCleanup(stage);
        }
    }

    pub(crate) fn records(&self) -> impl Iterator<Item = &MountRecord> {
        self.records.values()
    }
}
