//! Judging finished cases and rendering their report entries.
//!
//! Rules, in order:
//!
//! 1. A case that had to be signalled fails as timed out, whatever it
//!    expected.
//! 2. A case whose compile succeeded fails. Only the sanity case may
//!    compile, and it is judged separately by [`evaluate_sanity`].
//! 3. A failed compile passes when the case expects any failure, or when one
//!    of its patterns matches stdout or stderr.

use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use nc_directive::{CaseDescriptor, Expectation, SANITY_CASE_NAME};

use crate::clock::Stamp;
use crate::runner::FinishedCase;

/// Why a case failed, with the output it produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
    pub reason: String,
    pub stdout: String,
    pub stderr: String,
}

/// Outcome of a single case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail(Failure),
}

impl Outcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Outcome::Fail(_))
    }

    /// Build a failed outcome.
    #[cold]
    pub fn fail(reason: impl Into<String>, stdout: &str, stderr: &str) -> Self {
        Outcome::Fail(Failure {
            reason: reason.into(),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        })
    }
}

/// A judged case, ready for the report.
#[derive(Clone, Debug)]
pub struct EvaluatedCase {
    pub descriptor: CaseDescriptor,
    pub outcome: Outcome,
    /// `None` for disabled cases, which never run.
    pub command_line: Option<String>,
    /// Start and finish of the compile; `None` for disabled cases.
    pub timing: Option<(Stamp, Stamp)>,
}

impl EvaluatedCase {
    /// A disabled case: passes without running.
    pub fn disabled(descriptor: CaseDescriptor) -> Self {
        EvaluatedCase {
            descriptor,
            outcome: Outcome::Pass,
            command_line: None,
            timing: None,
        }
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Append this case's entry to the generated source: an empty test for a
    /// pass, a block of `#error` lines for a failure.
    pub fn render_artifact(&self, out: &mut String) {
        match &self.outcome {
            Outcome::Pass => {
                out.push_str(&format!(
                    "\nTEST({}, {}) {{ }}\n",
                    self.descriptor.suite(),
                    self.name()
                ));
            }
            Outcome::Fail(failure) => self.render_failure(failure, out),
        }
    }

    /// Append the timing line for a pass that actually ran. Failures and
    /// disabled cases log nothing.
    pub fn render_log(&self, out: &mut String) {
        let (Outcome::Pass, Some((started, finished))) = (&self.outcome, self.timing) else {
            return;
        };
        out.push_str(&format!(
            "\nTEST({}, {}) took {:.6} secs. Started at {:.6}, ended at {:.6}.\n",
            self.descriptor.suite(),
            self.name(),
            finished.since(started).as_secs_f64(),
            started.epoch_secs(),
            finished.epoch_secs(),
        ));
    }

    fn render_failure(&self, failure: &Failure, out: &mut String) {
        let name = self.name();
        push_error(out, &format!("{name} Failed: {}", failure.reason));
        push_error(
            out,
            &format!(
                "compile line: {}",
                self.command_line.as_deref().unwrap_or_default()
            ),
        );
        for (stream, text) in [("stdout", &failure.stdout), ("stderr", &failure.stderr)] {
            if text.is_empty() {
                continue;
            }
            push_error(out, &format!("{name} {stream}:"));
            for line in text.lines() {
                push_error(out, &format!("  {line}"));
            }
        }
        out.push('\n');
    }
}

/// `#error "<text>"`, with the text escaped so it stays one string literal.
fn push_error(out: &mut String, text: &str) {
    out.push_str("#error \"");
    for c in text.chars() {
        match c {
            '\\' | '"' => {
                out.push('\\');
                out.push(c);
            }
            '\r' => {}
            _ => out.push(c),
        }
    }
    out.push_str("\"\n");
}

/// Judge an ordinary (non-sanity) case.
pub fn evaluate(case: FinishedCase) -> EvaluatedCase {
    let outcome = judge(&case);
    tracing::debug!(case = case.descriptor.name(), pass = outcome.is_pass(), "evaluated case");
    EvaluatedCase {
        outcome,
        command_line: Some(case.command_line),
        timing: Some((case.started, case.finished)),
        descriptor: case.descriptor,
    }
}

fn judge(case: &FinishedCase) -> Outcome {
    if let Some(aborted) = case.aborted {
        return Outcome::fail(timed_out_reason(case.started, aborted), "", "");
    }
    if case.status.success() {
        return Outcome::fail("Unexpected successful compilation.", &case.stdout, &case.stderr);
    }
    match case.descriptor.expectation() {
        Expectation::ExpectFailureAny => Outcome::Pass,
        Expectation::ExpectFailureMatching(patterns) => {
            if patterns
                .iter()
                .any(|p| p.is_match(&case.stdout) || p.is_match(&case.stderr))
            {
                Outcome::Pass
            } else {
                Outcome::fail(
                    format!(
                        "Expectations [{}] did not match output.",
                        case.descriptor.expectation().describe_patterns()
                    ),
                    &case.stdout,
                    &case.stderr,
                )
            }
        }
        // Only reachable if a sanity case is routed here; it compiled, which
        // is a failure for any ordinary case.
        Expectation::ExpectSuccess => Outcome::fail(
            "Unexpected successful compilation.",
            &case.stdout,
            &case.stderr,
        ),
    }
}

fn timed_out_reason(started: Stamp, aborted: Stamp) -> String {
    format!(
        "Compile timed out. Started {:.6} ended {:.6}.",
        started.epoch_secs(),
        aborted.epoch_secs()
    )
}

/// How the sanity compile went. Its exit code becomes the driver's.
#[derive(Clone, Debug)]
pub struct SanityResult {
    pub exit_code: i32,
    /// Timeout reason, when the compile had to be signalled.
    pub timeout: Option<String>,
    pub command_line: String,
    pub stdout: String,
    pub stderr: String,
}

impl SanityResult {
    pub fn passed(&self) -> bool {
        self.exit_code == 0
    }

    pub fn timed_out(&self) -> bool {
        self.timeout.is_some()
    }

    /// Why the sanity compile failed and how it was invoked; empty when it
    /// passed.
    pub fn failure_report(&self) -> String {
        if self.passed() {
            return String::new();
        }
        let reason = match &self.timeout {
            Some(reason) => reason.clone(),
            None => format!("Compiler exited with status {}.", self.exit_code),
        };
        format!(
            "{SANITY_CASE_NAME} Failed: {reason}\ncompile line: {}\n",
            self.command_line
        )
    }
}

/// Judge the sanity case: it passes iff the compiler exited with 0 and was
/// never signalled.
pub fn evaluate_sanity(case: FinishedCase) -> SanityResult {
    let timeout = case
        .aborted
        .map(|aborted| timed_out_reason(case.started, aborted));
    let mut exit_code = shell_exit_code(case.status);
    if timeout.is_some() && exit_code == 0 {
        exit_code = 1;
    }
    if exit_code != 0 {
        tracing::info!(
            exit_code,
            timed_out = timeout.is_some(),
            command = %case.command_line,
            "sanity compile failed"
        );
    }
    SanityResult {
        exit_code,
        timeout,
        command_line: case.command_line,
        stdout: case.stdout,
        stderr: case.stderr,
    }
}

/// Shell-style exit code: the status code, or 128 + signal for a signal
/// death.
fn shell_exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
