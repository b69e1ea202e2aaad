#![allow(dead_code)]

use assert_cmd::Command;
use std::time::Duration;
use tempfile::TempDir;

use glustervol_shared::constants::envs;

pub struct TestContext {
    pub cmd: Command,
    pub root: TempDir,
}

impl TestContext {
    /// Fresh command with a clean environment and the test root.
    pub fn new_cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_glustervol"));
        cmd.timeout(Duration::from_secs(30));
        for var in [envs::SERVERS, envs::ROOT, envs::REST, envs::GFS_BASE] {
            cmd.env_remove(var);
        }
        cmd.arg("--root").arg(self.root.path());
        cmd
    }
}

pub fn glustervol() -> TestContext {
    let root = TempDir::new().expect("Failed to create temp dir");
    let mut ctx = TestContext {
        cmd: Command::new(env!("CARGO_BIN_EXE_glustervol")),
        root,
    };
    ctx.cmd = ctx.new_cmd();
    ctx
}

/// Render requests as JSON lines.
pub fn requests(lines: &[serde_json::Value]) -> String {
    lines.iter().map(|l| format!("{}\n", l)).collect()
}
