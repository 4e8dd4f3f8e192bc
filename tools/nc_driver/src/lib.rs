//! No-compile test driver.
//!
//! Runs one compiler invocation per case extracted by [`nc_directive`],
//! at most `parallelism` at a time, and folds the outcomes into a single
//! generated source file plus a timing log.
//!
//! The pipeline is strictly linear:
//!
//! ```text
//! extract -> CaseRunner::start -> Scheduler -> evaluate -> RunSummary
//! ```
//!
//! Only the [`Scheduler`] keeps state across cases. Everything after it
//! works on owned, finished cases.

#[cfg(not(unix))]
compile_error!("nc_driver drives POSIX processes and only builds on Unix hosts");

mod clock;
mod config;
mod driver;
mod error;
mod evaluate;
mod report;
mod runner;
mod scheduler;
mod sys;

use std::sync::Once;

pub use clock::Stamp;
pub use config::{DriverConfig, TimeoutPolicy, USAGE};
pub use driver::{run, run_and_persist};
pub use error::DriverError;
pub use evaluate::{evaluate, evaluate_sanity, EvaluatedCase, Failure, Outcome, SanityResult};
pub use report::{artifact_header, RunSummary, StageTimings};
pub use runner::{CaseRunner, Escalation, FinishedCase, RunningCase};
pub use scheduler::Scheduler;

/// Guard to ensure tracing is only initialized once.
static TRACING_INIT: Once = Once::new();

/// Initialize tracing for the driver.
///
/// Logging is opt-in: nothing is installed unless `RUST_LOG` is set, so the
/// compiler output forwarded on stdout/stderr stays clean by default.
///
/// ```bash
/// RUST_LOG=nc_driver=debug nocompile clang++ 8 foo.nc out.cc -- -std=c++17
/// ```
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_ok() {
            use tracing_subscriber::{fmt, prelude::*, EnvFilter};

            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
