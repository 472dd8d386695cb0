#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

pub struct TestContext {
    pub cmd: Command,
    pub config: PathBuf,
    // Keeps the config file alive for the test
    pub _dir: TempDir,
}

impl TestContext {
    /// Fresh `vmbake` command sharing the same config.
    pub fn new_cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_vmbake"));
        cmd.timeout(Duration::from_secs(30));
        cmd
    }
}

/// `vmbake` command plus a config file holding `json`.
pub fn vmbake(json: &str) -> TestContext {
    let dir = vmbake_test_utils::temp_dir();
    let config = vmbake_test_utils::write_config(dir.path(), json);

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_vmbake"));
    // You can override this with .timeout(Duration::from_secs(N))
    cmd.timeout(Duration::from_secs(30));

    TestContext {
        cmd,
        config,
        _dir: dir,
    }
}
