//! Shared fixtures: a scratch workspace and `/bin/sh` fake compilers.
//!
//! The "compiler" is always `/bin/sh` with the script as its first flag,
//! so the script sees the driver's arguments as `$@`.

#![allow(dead_code, reason = "not every test binary uses every helper")]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use nc_driver::{DriverConfig, TimeoutPolicy};
use tempfile::TempDir;

/// Parses the driver's arguments into `$name` (the `-D` case, empty for the
/// sanity case) and `$depfile` (the `-MF` target).
const PRELUDE: &str = r#"#!/bin/sh
name=""
depfile=""
prev=""
for arg in "$@"; do
  case "$prev" in -MF) depfile="$arg" ;; esac
  case "$arg" in -D*) name="${arg#-D}" ;; esac
  prev="$arg"
done
"#;

/// Short deadlines so timeout tests finish in about a second.
pub fn fast_policy() -> TimeoutPolicy {
    TimeoutPolicy {
        terminate: Duration::from_millis(300),
        kill: Duration::from_millis(900),
        busy_loop_ceiling: Duration::from_secs(20),
        settle_delay: Duration::from_millis(20),
    }
}

pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Workspace {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a fake compiler whose body runs after the argument prelude.
    pub fn compiler(&self, body: &str) -> PathBuf {
        let path = self.path().join("fake_compiler.sh");
        fs::write(&path, format!("{PRELUDE}{body}\n")).expect("write fake compiler");
        path
    }

    pub fn source(&self, file_name: &str, text: &str) -> PathBuf {
        let path = self.path().join(file_name);
        fs::write(&path, text).expect("write source");
        path
    }

    /// Configuration running `script` through `/bin/sh`.
    pub fn config(&self, script: &Path, source: &Path, parallelism: usize) -> DriverConfig {
        DriverConfig {
            compiler: PathBuf::from("/bin/sh"),
            parallelism,
            source: source.to_path_buf(),
            result: self.path().join("result_nc.cc"),
            flags: vec![script.to_string_lossy().into_owned()],
            policy: fast_policy(),
        }
    }

    /// Cases the fake compiler recorded via `launched`, in launch order.
    pub fn launched(&self) -> Vec<String> {
        fs::read_to_string(self.launch_log())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn launch_log(&self) -> PathBuf {
        self.path().join("launched.txt")
    }
}

/// Script line recording `$name` (or `SANITY`) in `log`.
pub fn record_launch(log: &Path) -> String {
    format!(
        "echo \"${{name:-SANITY}}\" >> '{}'",
        log.to_string_lossy()
    )
}
