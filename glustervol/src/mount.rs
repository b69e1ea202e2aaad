//! Attach and detach GlusterFS volumes through the external client.
//!
//! A single attempt per call; no retries. The client's combined output is
//! logged on failure and the caller only sees which program failed and how.

use std::path::Path;
use std::process::{Command, Output};

use glustervol_shared::errors::{VolumeError, VolumeResult};

use crate::options::MountOptions;

/// Performs the physical mount and unmount of a volume.
pub trait MountExecutor: Send + Sync {
    /// Attach `volume` from `servers` at `destination`.
    fn mount(&self, volume: &str, servers: &[String], destination: &Path) -> VolumeResult<()>;

    /// Detach whatever is mounted at `destination`.
    fn unmount(&self, destination: &Path) -> VolumeResult<()>;
}

/// Runs `glusterfs` / `umount` as child processes.
#[derive(Debug, Clone, Default)]
pub struct GlusterfsMounter {
    options: MountOptions,
}

impl GlusterfsMounter {
    pub fn new(options: MountOptions) -> Self {
        Self { options }
    }

    /// `glusterfs --volfile-id=<volume> -s <server>... <destination>`
    pub fn mount_command(&self, volume: &str, servers: &[String], destination: &Path) -> Command {
        let mut cmd = Command::new(&self.options.mount_program);
        cmd.arg(format!("--volfile-id={}", volume));
        for server in servers {
            cmd.arg("-s").arg(server);
        }
        cmd.arg(destination);
        cmd
    }

    /// `umount <destination>`
    pub fn unmount_command(&self, destination: &Path) -> Command {
        let mut cmd = Command::new(&self.options.unmount_program);
        cmd.arg(destination);
        cmd
    }
}

impl MountExecutor for GlusterfsMounter {
    fn mount(&self, volume: &str, servers: &[String], destination: &Path) -> VolumeResult<()> {
        tracing::debug!(
            volume,
            servers = ?servers,
            destination = %destination.display(),
            "Running mount client"
        );
        run(self.mount_command(volume, servers, destination))
    }

    fn unmount(&self, destination: &Path) -> VolumeResult<()> {
        tracing::debug!(destination = %destination.display(), "Running unmount client");
        run(self.unmount_command(destination))
    }
}

fn run(mut cmd: Command) -> VolumeResult<()> {
    let program = cmd.get_program().to_string_lossy().into_owned();

    let output = cmd.output().map_err(|e| VolumeError::Command {
        program: program.clone(),
        reason: format!("failed to spawn: {}", e),
    })?;

    if !output.status.success() {
        tracing::error!(
            program = %program,
            status = ?output.status.code(),
            "{}",
            combined_output(&output).trim_end()
        );
        return Err(VolumeError::Command {
            program,
            reason: format!("exited with {}", output.status),
        });
    }

    Ok(())
}

/// stdout followed by stderr.
fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}
