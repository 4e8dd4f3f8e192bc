//! Aggregating evaluated cases into the generated source and the log.

use std::fs;
use std::path::{Path, PathBuf};

use crate::clock::Stamp;
use crate::config::DriverConfig;
use crate::error::DriverError;
use crate::evaluate::{EvaluatedCase, SanityResult};

/// The five points in a run the breakdown line is computed from.
#[derive(Clone, Copy, Debug)]
pub struct StageTimings {
    pub started: Stamp,
    pub extract_done: Stamp,
    pub header_written: Stamp,
    pub compile_done: Stamp,
    pub results_processed: Stamp,
}

impl StageTimings {
    /// `\nTEST(<suite>): Started .., Ended .., Total ..s, Extract ..s, Compile ..s, Process ..s\n`
    pub fn render(&self, suite: &str) -> String {
        format!(
            "\nTEST({suite}): Started {:.6}, Ended {:.6}, Total {:.6}s, Extract {:.6}s, \
             Compile {:.6}s, Process {:.6}s\n",
            self.started.epoch_secs(),
            self.results_processed.epoch_secs(),
            self.results_processed.since(self.started).as_secs_f64(),
            self.extract_done.since(self.started).as_secs_f64(),
            self.compile_done.since(self.extract_done).as_secs_f64(),
            self.results_processed.since(self.compile_done).as_secs_f64(),
        )
    }
}

/// Opening lines of the generated source.
pub fn artifact_header(source: &Path) -> String {
    format!(
        "\n// This file is generated by the no compile test from:\n\
         //   {}\n\
         \n\
         #include \"base/logging.h\"\n\
         #include \"testing/gtest/include/gtest/gtest.h\"\n\
         \n",
        source.display()
    )
}

/// Everything one run produced.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub suite: String,
    header: String,
    /// Sorted by case name.
    cases: Vec<EvaluatedCase>,
    pub sanity: SanityResult,
    pub timings: StageTimings,
}

impl RunSummary {
    /// Build a summary. Cases are sorted by name here, so the report never
    /// depends on completion order.
    pub fn new(
        suite: String,
        header: String,
        mut cases: Vec<EvaluatedCase>,
        sanity: SanityResult,
        timings: StageTimings,
    ) -> Self {
        cases.sort_by(|a, b| a.name().cmp(b.name()));
        RunSummary {
            suite,
            header,
            cases,
            sanity,
            timings,
        }
    }

    pub fn cases(&self) -> &[EvaluatedCase] {
        &self.cases
    }

    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.outcome.is_pass()).count()
    }

    pub fn failed(&self) -> usize {
        self.cases.iter().filter(|c| c.outcome.is_fail()).count()
    }

    /// The driver's exit status: the sanity compile's.
    pub fn exit_code(&self) -> i32 {
        self.sanity.exit_code
    }

    /// The generated source: header plus one entry per case.
    pub fn artifact(&self) -> String {
        let mut out = self.header.clone();
        for case in &self.cases {
            case.render_artifact(&mut out);
        }
        out
    }

    /// Timing lines for passes that ran, then the stage breakdown.
    pub fn log(&self) -> String {
        let mut out = String::new();
        for case in &self.cases {
            case.render_log(&mut out);
        }
        out.push_str(&self.timings.render(&self.suite));
        out
    }

    /// Write `<result>.log` always and `<result>` only when the sanity
    /// compile passed. Returns the paths written.
    pub fn persist(&self, config: &DriverConfig) -> Result<Vec<PathBuf>, DriverError> {
        let mut written = Vec::with_capacity(2);

        let log_path = config.log_path();
        fs::write(&log_path, self.log()).map_err(|e| DriverError::io(&log_path, e))?;
        written.push(log_path);

        if self.sanity.passed() {
            fs::write(&config.result, self.artifact())
                .map_err(|e| DriverError::io(&config.result, e))?;
            written.push(config.result.clone());
        } else {
            tracing::info!(
                result = %config.result.display(),
                "sanity compile failed, not writing result"
            );
        }
        Ok(written)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
