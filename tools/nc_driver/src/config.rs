//! Driver configuration.
//!
//! The invocation contract is fixed and positional:
//!
//! ```text
//! nocompile <compiler> <parallelism> <source> <result> -- <compiler flags...>
//! ```
//!
//! There is no option grammar. Everything after `--` goes to the compiler
//! unchanged.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::DriverError;

/// One-line usage text, printed when the argument shape is wrong.
pub const USAGE: &str =
    "<compiler> <parallelism> <sourcefile> <resultfile> -- <cflags...>";

/// Deadlines applied to every compiler invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeoutPolicy {
    /// Age after which SIGTERM is sent.
    pub terminate: Duration,
    /// Age after which SIGKILL is sent.
    pub kill: Duration,
    /// Longest a single harvest may spin without any case finishing.
    pub busy_loop_ceiling: Duration,
    /// Pause between polls when nothing finished.
    pub settle_delay: Duration,
}

impl TimeoutPolicy {
    const KILL_GRACE: Duration = Duration::from_secs(2);
    const SETTLE_DELAY: Duration = Duration::from_millis(100);

    /// Policy with the given terminate deadline. Kill follows two seconds
    /// later and the busy-loop ceiling is twice the kill deadline.
    pub fn with_terminate(terminate: Duration) -> Self {
        let kill = terminate + Self::KILL_GRACE;
        TimeoutPolicy {
            terminate,
            kill,
            busy_loop_ceiling: kill * 2,
            settle_delay: Self::SETTLE_DELAY,
        }
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self::with_terminate(Duration::from_secs(120))
    }
}

/// Everything one run needs to know.
#[derive(Clone, Debug)]
pub struct DriverConfig {
    /// Compiler executable.
    pub compiler: PathBuf,
    /// Maximum number of compiler processes alive at once.
    pub parallelism: usize,
    /// Annotated source file.
    pub source: PathBuf,
    /// Generated artifact path; the log and dependency file sit beside it.
    pub result: PathBuf,
    /// Flags passed to every compiler invocation, before the driver's own.
    pub flags: Vec<String>,
    pub policy: TimeoutPolicy,
}

impl DriverConfig {
    /// Build a configuration from the arguments after the program name.
    ///
    /// Returns [`DriverError::Usage`] when the shape is wrong and
    /// [`DriverError::InvalidInput`] when a value is unusable.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, DriverError> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        if args.len() < 5 || args[4] != "--" {
            return Err(DriverError::Usage);
        }

        let compiler = PathBuf::from(args[0]);
        if !compiler.is_file() {
            return Err(DriverError::InvalidInput(format!(
                "compiler '{}' is not an existing file",
                compiler.display()
            )));
        }

        let parallelism = match args[1].parse::<usize>() {
            Ok(n) if n >= 1 => n,
            _ => {
                return Err(DriverError::InvalidInput(format!(
                    "parallelism must be an integer >= 1, got '{}'",
                    args[1]
                )))
            }
        };

        Ok(DriverConfig {
            compiler,
            parallelism,
            source: PathBuf::from(args[2]),
            result: PathBuf::from(args[3]),
            flags: args[5..].iter().map(|s| (*s).to_string()).collect(),
            policy: TimeoutPolicy::default(),
        })
    }

    /// `<result>.log`
    pub fn log_path(&self) -> PathBuf {
        with_suffix(&self.result, ".log")
    }

    /// `<result>.d`, written by the compiler itself.
    pub fn dep_path(&self) -> PathBuf {
        with_suffix(&self.result, ".d")
    }

    /// Directory for the per-case scratch files: the result's directory, or
    /// the working directory for a bare file name.
    pub fn scratch_dir(&self) -> PathBuf {
        match self.result.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Flags for every invocation, including the dependency-file request.
    pub fn compiler_flags(&self) -> Vec<String> {
        let mut flags = self.flags.clone();
        flags.extend([
            "-MMD".to_string(),
            "-MF".to_string(),
            self.dep_path().to_string_lossy().into_owned(),
            "-MT".to_string(),
            self.result.to_string_lossy().into_owned(),
        ]);
        flags
    }
}

/// Append `suffix` to the full file name (`out.cc` -> `out.cc.log`).
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
