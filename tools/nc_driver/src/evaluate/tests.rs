use super::*;
use crate::runner::Escalation;
use nc_directive::Pattern;
use pretty_assertions::assert_eq;
use std::time::Duration;

const SUITE: &str = "NoCompileSample";

/// Wait status for a normal exit with `code`.
fn exited(code: i32) -> ExitStatus {
    ExitStatus::from_raw(code << 8)
}

fn descriptor(name: &str, patterns: &[&str]) -> CaseDescriptor {
    let patterns = patterns.iter().map(|p| Pattern::new(p).unwrap()).collect();
    CaseDescriptor::new(
        name.to_string(),
        SUITE.to_string(),
        Expectation::failure(patterns),
        1,
    )
}

fn finished(descriptor: CaseDescriptor, status: ExitStatus, stdout: &str, stderr: &str) -> FinishedCase {
    let started = Stamp::now();
    FinishedCase {
        command_line: format!("c++ -D{} -o /dev/null -c -x c++ t.nc", descriptor.name()),
        descriptor,
        status,
        started,
        finished: started.later_by(Duration::from_millis(250)),
        aborted: None,
        escalation: Escalation::default(),
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }
}

#[test]
fn test_any_failure_passes_regardless_of_output() {
    let case = finished(descriptor("NCTEST_ANY", &[]), exited(1), "", "");
    assert_eq!(evaluate(case).outcome, Outcome::Pass);
}

#[test]
fn test_matching_pattern_in_stderr_passes() {
    let case = finished(
        descriptor("NCTEST_M", &["no match", "error: foo"]),
        exited(1),
        "",
        "t.nc:3:1: error: foo\n",
    );
    assert!(evaluate(case).outcome.is_pass());
}

#[test]
fn test_matching_pattern_in_stdout_passes() {
    let case = finished(descriptor("NCTEST_M", &["deleted"]), exited(1), "use of deleted function\n", "");
    assert!(evaluate(case).outcome.is_pass());
}

#[test]
fn test_mismatch_fails_with_pattern_list() {
    let case = finished(
        descriptor("NCTEST_MISS", &["alpha", "beta"]),
        exited(1),
        "",
        "error: gamma\n",
    );
    assert_eq!(
        evaluate(case).outcome,
        Outcome::fail(
            "Expectations [r'alpha', r'beta'] did not match output.",
            "",
            "error: gamma\n"
        )
    );
}

#[test]
fn test_unexpected_success_fails_even_for_any() {
    let case = finished(descriptor("NCTEST_OK", &[]), exited(0), "", "");
    let evaluated = evaluate(case);
    assert!(matches!(
        evaluated.outcome,
        Outcome::Fail(ref f) if f.reason == "Unexpected successful compilation."
    ));
}

#[test]
fn test_timeout_overrides_expectation() {
    let mut case = finished(descriptor("NCTEST_HANG", &[]), ExitStatus::from_raw(15), "x", "y");
    case.aborted = Some(case.started.later_by(Duration::from_secs(120)));
    let Outcome::Fail(failure) = evaluate(case).outcome else {
        panic!("timed-out case must fail");
    };
    assert!(failure.reason.starts_with("Compile timed out. Started "));
    assert!(failure.reason.ends_with('.'));
    assert_eq!(failure.stdout, "");
    assert_eq!(failure.stderr, "");
}

#[test]
fn test_pass_renders_stub_and_log_line() {
    let evaluated = evaluate(finished(descriptor("NCTEST_A", &[]), exited(1), "", ""));
    let mut artifact = String::new();
    evaluated.render_artifact(&mut artifact);
    assert_eq!(artifact, "\nTEST(NoCompileSample, NCTEST_A) { }\n");

    let mut log = String::new();
    evaluated.render_log(&mut log);
    assert!(log.starts_with("\nTEST(NoCompileSample, NCTEST_A) took 0.250000 secs. Started at "));
    assert!(log.ends_with(".\n"));
}

#[test]
fn test_disabled_renders_stub_without_log() {
    let evaluated = EvaluatedCase::disabled(descriptor("DISABLED_NCTEST_X", &["x"]));
    let mut artifact = String::new();
    let mut log = String::new();
    evaluated.render_artifact(&mut artifact);
    evaluated.render_log(&mut log);
    assert_eq!(artifact, "\nTEST(NoCompileSample, DISABLED_NCTEST_X) { }\n");
    assert_eq!(log, "");
}

#[test]
fn test_failure_block() {
    let evaluated = evaluate(finished(
        descriptor("NCTEST_MISS", &["want"]),
        exited(1),
        "note: \"quoted\"\n",
        "error: got\nC:\\path\n",
    ));
    let mut artifact = String::new();
    evaluated.render_artifact(&mut artifact);
    assert_eq!(
        artifact,
        "#error \"NCTEST_MISS Failed: Expectations [r'want'] did not match output.\"\n\
         #error \"compile line: c++ -DNCTEST_MISS -o /dev/null -c -x c++ t.nc\"\n\
         #error \"NCTEST_MISS stdout:\"\n\
         #error \"  note: \\\"quoted\\\"\"\n\
         #error \"NCTEST_MISS stderr:\"\n\
         #error \"  error: got\"\n\
         #error \"  C:\\\\path\"\n\
         \n"
    );

    let mut log = String::new();
    evaluated.render_log(&mut log);
    assert_eq!(log, "");
}

#[test]
fn test_failure_block_skips_empty_streams() {
    let evaluated = evaluate(finished(descriptor("NCTEST_OK", &[]), exited(0), "", ""));
    let mut artifact = String::new();
    evaluated.render_artifact(&mut artifact);
    assert_eq!(artifact.lines().count(), 3);
    assert!(!artifact.contains("stdout:"));
}

#[test]
fn test_sanity_success() {
    let result = evaluate_sanity(finished(CaseDescriptor::sanity(SUITE), exited(0), "", ""));
    assert!(result.passed());
    assert_eq!(result.exit_code, 0);
    assert!(!result.timed_out());
    assert_eq!(result.failure_report(), "");
}

#[test]
fn test_sanity_failure_keeps_exit_code_and_output() {
    let result = evaluate_sanity(finished(
        CaseDescriptor::sanity(SUITE),
        exited(3),
        "",
        "fatal error: missing.h\n",
    ));
    assert!(!result.passed());
    assert_eq!(result.exit_code, 3);
    assert_eq!(result.stderr, "fatal error: missing.h\n");
    assert_eq!(
        result.failure_report(),
        "NCTEST_SANITY Failed: Compiler exited with status 3.\n\
         compile line: c++ -DNCTEST_SANITY -o /dev/null -c -x c++ t.nc\n"
    );
}

#[test]
fn test_sanity_signal_death_maps_to_128_plus_signal() {
    let result = evaluate_sanity(finished(
        CaseDescriptor::sanity(SUITE),
        ExitStatus::from_raw(libc::SIGKILL),
        "",
        "",
    ));
    assert_eq!(result.exit_code, 128 + libc::SIGKILL);
}

#[test]
fn test_sanity_timeout_fails_even_with_zero_status() {
    let mut case = finished(CaseDescriptor::sanity(SUITE), exited(0), "", "");
    case.aborted = Some(case.started);
    let result = evaluate_sanity(case);
    assert!(result.timed_out());
    assert!(!result.passed());
    let report = result.failure_report();
    assert!(report.starts_with("NCTEST_SANITY Failed: Compile timed out. Started "));
    assert!(report.contains("\ncompile line: c++ -DNCTEST_SANITY "));
}
