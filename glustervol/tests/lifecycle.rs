//! Integration tests for the mount/unmount lifecycle.

use glustervol::{CleanupStage, MountState, VolumeError, VolumeInfo};
use glustervol_test_utils::{FakeRemote, MountCall, TestDriver, servers};

#[test]
fn test_mount_then_unmount_leaves_table_empty() {
    let ctx = TestDriver::local();

    let path = ctx.driver.mount("data").unwrap();
    ctx.driver.unmount("data").unwrap();

    assert!(ctx.driver.records().is_empty());
    assert_eq!(ctx.mounter.mount_count(), 1);
    assert_eq!(ctx.mounter.unmount_count(), 1);
    assert!(!path.exists());
}

#[test]
fn test_two_mounts_two_unmounts_scenario() {
    let ctx = TestDriver::local();
    let expected = ctx.driver.root().join("data");

    // First mount: directory created, client invoked with both servers
    let path = ctx.driver.mount("data").unwrap();
    assert_eq!(path, expected);
    assert!(path.is_dir());
    assert_eq!(
        ctx.mounter.calls(),
        vec![MountCall::Mount {
            volume: "data".to_string(),
            servers: servers(),
            destination: expected.clone(),
        }]
    );
    let record = ctx.driver.mounted("data").unwrap();
    assert_eq!(record.volume_name, "data");
    assert_eq!(record.reference_count, 1);

    // Second mount: no external call, same path
    assert_eq!(ctx.driver.mount("data").unwrap(), expected);
    assert_eq!(ctx.mounter.calls().len(), 1);
    assert_eq!(ctx.driver.mounted("data").unwrap().reference_count, 2);

    // First unmount: count drops, nothing external
    ctx.driver.unmount("data").unwrap();
    assert_eq!(ctx.driver.mounted("data").unwrap().reference_count, 1);
    assert_eq!(ctx.mounter.unmount_count(), 0);

    // Last unmount: unmounted, directory removed, table empty
    ctx.driver.unmount("data").unwrap();
    assert_eq!(ctx.mounter.unmount_count(), 1);
    assert!(!expected.exists());
    assert!(ctx.driver.records().is_empty());
}

#[test]
fn test_n_mounts_need_n_unmounts() {
    let ctx = TestDriver::local();
    const N: u32 = 5;

    for _ in 0..N {
        ctx.driver.mount("data").unwrap();
    }
    assert_eq!(ctx.driver.mounted("data").unwrap().reference_count, N);
    assert_eq!(ctx.mounter.mount_count(), 1);

    for i in 1..N {
        ctx.driver.unmount("data").unwrap();
        assert_eq!(
            ctx.driver.mounted("data").unwrap().reference_count,
            N - i
        );
        assert_eq!(ctx.mounter.unmount_count(), 0);
    }

    ctx.driver.unmount("data").unwrap();
    assert!(ctx.driver.mounted("data").is_none());
    assert_eq!(ctx.mounter.unmount_count(), 1);

    // One more is an error
    assert!(matches!(
        ctx.driver.unmount("data"),
        Err(VolumeError::NotMounted { .. })
    ));
}

#[test]
fn test_mount_reuses_existing_directory() {
    let ctx = TestDriver::local();
    let path = ctx.driver.path("data");
    std::fs::create_dir_all(&path).unwrap();

    assert_eq!(ctx.driver.mount("data").unwrap(), path);
    assert_eq!(ctx.mounter.mount_count(), 1);
}

#[test]
fn test_volumes_are_independent() {
    let ctx = TestDriver::local();

    let a = ctx.driver.mount("a").unwrap();
    let b = ctx.driver.mount("b").unwrap();
    assert_ne!(a, b);

    ctx.driver.unmount("a").unwrap();
    assert!(ctx.driver.mounted("a").is_none());
    assert_eq!(ctx.driver.mounted("b").unwrap().reference_count, 1);
    assert!(b.is_dir());
}

#[test]
fn test_failed_directory_removal_is_pending() {
    let ctx = TestDriver::local();
    let path = ctx.driver.mount("data").unwrap();

    ctx.dirs.fail_removals(true);
    let result = ctx.driver.unmount("data");

    assert!(matches!(
        result,
        Err(VolumeError::Filesystem { action: "remove directory", .. })
    ));
    let record = ctx.driver.mounted("data").unwrap();
    assert_eq!(
        record.state,
        MountState::PendingCleanup(CleanupStage::RemoveDir)
    );
    assert_eq!(record.reference_count, 0);
    assert_eq!(ctx.mounter.unmount_count(), 1);
    assert!(path.is_dir());

    // Still pending while removal keeps failing
    assert!(ctx.driver.unmount("data").is_err());
    assert!(ctx.driver.mounted("data").is_some());

    // Retry only redoes the directory removal
    ctx.dirs.fail_removals(false);
    ctx.driver.unmount("data").unwrap();
    assert!(ctx.driver.mounted("data").is_none());
    assert_eq!(ctx.mounter.unmount_count(), 1);
    assert_eq!(ctx.dirs.removals(), vec![path.clone(), path.clone(), path.clone()]);
    assert!(!path.exists());
}

#[test]
fn test_remove_refused_while_directory_cleanup_pending() {
    let ctx = TestDriver::with_remote(FakeRemote::with_volumes(&["data"]));
    ctx.driver.mount("data").unwrap();
    ctx.dirs.fail_removals(true);
    ctx.driver.unmount("data").unwrap_err();

    assert!(matches!(
        ctx.driver.remove("data"),
        Err(VolumeError::CleanupPending { .. })
    ));
    assert_eq!(ctx.remote().volumes(), vec!["data".to_string()]);
}

#[test]
fn test_mount_after_directory_cleanup_failure_remounts() {
    let ctx = TestDriver::local();
    let path = ctx.driver.mount("data").unwrap();

    ctx.dirs.fail_removals(true);
    ctx.driver.unmount("data").unwrap_err();
    ctx.dirs.fail_removals(false);

    // Filesystem was detached, so a new mount runs the client again
    assert_eq!(ctx.driver.mount("data").unwrap(), path);
    assert_eq!(ctx.mounter.mount_count(), 2);
    let record = ctx.driver.mounted("data").unwrap();
    assert_eq!(record.state, MountState::Mounted);
    assert_eq!(record.reference_count, 1);

    ctx.driver.unmount("data").unwrap();
    assert!(ctx.driver.records().is_empty());
    assert_eq!(ctx.mounter.unmount_count(), 2);
}

#[test]
fn test_local_list_reports_mounted_volumes() {
    let ctx = TestDriver::local();
    assert!(ctx.driver.list().unwrap().is_empty());

    let b = ctx.driver.mount("b").unwrap();
    let a = ctx.driver.mount("a").unwrap();
    ctx.driver.mount("a").unwrap();

    assert_eq!(
        ctx.driver.list().unwrap(),
        vec![VolumeInfo::mounted("a", a), VolumeInfo::mounted("b", b)]
    );
}

#[test]
fn test_local_only_mode_cannot_create_or_remove() {
    let ctx = TestDriver::local();
    for name in ["data", "other"] {
        assert!(matches!(
            ctx.driver.create(name),
            Err(VolumeError::NoRemoteService { .. })
        ));
        assert!(matches!(
            ctx.driver.remove(name),
            Err(VolumeError::NoRemoteService { .. })
        ));
    }
}

#[test]
fn test_independent_drivers_have_separate_tables() {
    let first = TestDriver::local();
    let second = TestDriver::local();

    first.driver.mount("data").unwrap();
    assert!(second.driver.mounted("data").is_none());
    assert!(second.driver.list().unwrap().is_empty());
}
