//! Driver errors.
//!
//! Everything here aborts the run. Per-case failures (mismatches, timeouts,
//! unexpected successes) are outcomes, not errors, and a failing sanity case
//! is reported through [`RunSummary`](crate::RunSummary).

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use nc_directive::DirectiveError;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Wrong argument shape; the binary prints the usage line.
    #[error("invalid invocation")]
    Usage,

    #[error("{0}")]
    InvalidInput(String),

    #[error("{}: {source}", path.display())]
    Directive {
        path: PathBuf,
        #[source]
        source: DirectiveError,
    },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to launch '{}': {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to signal or reap the compiler for '{name}': {source}")]
    Process {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("no case finished within {elapsed:?}; a compiler process could not be reaped")]
    SchedulerStall { elapsed: Duration },

    #[error("internal error: {0}")]
    Internal(String),
}

impl DriverError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        DriverError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn process(name: &str, source: io::Error) -> Self {
        DriverError::Process {
            name: name.to_string(),
            source,
        }
    }
}
