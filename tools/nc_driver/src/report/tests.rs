use super::*;
use crate::config::TimeoutPolicy;
use crate::evaluate::Outcome;
use nc_directive::{CaseDescriptor, Expectation};
use pretty_assertions::assert_eq;
use std::time::Duration;

const SUITE: &str = "NoCompileSample";

fn timings() -> StageTimings {
    let started = Stamp::now();
    StageTimings {
        started,
        extract_done: started.later_by(Duration::from_millis(10)),
        header_written: started.later_by(Duration::from_millis(11)),
        compile_done: started.later_by(Duration::from_millis(1500)),
        results_processed: started.later_by(Duration::from_millis(1750)),
    }
}

fn sanity(exit_code: i32) -> SanityResult {
    SanityResult {
        exit_code,
        timeout: None,
        command_line: "c++ -o /dev/null -c -x c++ t.nc".to_string(),
        stdout: String::new(),
        stderr: String::new(),
    }
}

fn passed(name: &str) -> EvaluatedCase {
    let started = Stamp::now();
    EvaluatedCase {
        descriptor: CaseDescriptor::new(
            name.to_string(),
            SUITE.to_string(),
            Expectation::ExpectFailureAny,
            1,
        ),
        outcome: Outcome::Pass,
        command_line: Some(format!("c++ -D{name}")),
        timing: Some((started, started.later_by(Duration::from_millis(500)))),
    }
}

fn failed(name: &str) -> EvaluatedCase {
    EvaluatedCase {
        outcome: Outcome::fail("Unexpected successful compilation.", "", ""),
        ..passed(name)
    }
}

fn summary(cases: Vec<EvaluatedCase>, sanity_code: i32) -> RunSummary {
    RunSummary::new(
        SUITE.to_string(),
        artifact_header(Path::new("base/sample.nc")),
        cases,
        sanity(sanity_code),
        timings(),
    )
}

fn config_in(dir: &Path) -> DriverConfig {
    DriverConfig {
        compiler: PathBuf::from("/usr/bin/c++"),
        parallelism: 1,
        source: PathBuf::from("base/sample.nc"),
        result: dir.join("sample_nc.cc"),
        flags: Vec::new(),
        policy: TimeoutPolicy::default(),
    }
}

#[test]
fn test_header() {
    assert_eq!(
        artifact_header(Path::new("base/sample.nc")),
        "\n// This file is generated by the no compile test from:\n//   base/sample.nc\n\n\
         #include \"base/logging.h\"\n#include \"testing/gtest/include/gtest/gtest.h\"\n\n"
    );
}

#[test]
fn test_cases_are_sorted_by_name() {
    let summary = summary(
        vec![
            passed("NCTEST_C"),
            EvaluatedCase::disabled(CaseDescriptor::new(
                "DISABLED_NCTEST_Z".to_string(),
                SUITE.to_string(),
                Expectation::ExpectFailureAny,
                9,
            )),
            failed("NCTEST_B"),
            passed("NCTEST_A"),
        ],
        0,
    );
    let names: Vec<&str> = summary.cases().iter().map(EvaluatedCase::name).collect();
    assert_eq!(
        names,
        vec!["DISABLED_NCTEST_Z", "NCTEST_A", "NCTEST_B", "NCTEST_C"]
    );
    assert_eq!(summary.passed(), 3);
    assert_eq!(summary.failed(), 1);

    let artifact = summary.artifact();
    let a = artifact.find("NCTEST_A) { }").unwrap();
    let b = artifact.find("#error \"NCTEST_B Failed").unwrap();
    let c = artifact.find("NCTEST_C) { }").unwrap();
    assert!(a < b && b < c);
}

#[test]
fn test_artifact_is_independent_of_input_order() {
    let forward = summary(vec![passed("NCTEST_A"), failed("NCTEST_B")], 0);
    let backward = summary(vec![failed("NCTEST_B"), passed("NCTEST_A")], 0);
    assert_eq!(forward.artifact(), backward.artifact());
}

#[test]
fn test_log_has_timed_passes_and_breakdown() {
    let summary = summary(
        vec![
            passed("NCTEST_A"),
            failed("NCTEST_B"),
            EvaluatedCase::disabled(CaseDescriptor::new(
                "DISABLED_NCTEST_D".to_string(),
                SUITE.to_string(),
                Expectation::ExpectFailureAny,
                4,
            )),
        ],
        0,
    );
    let log = summary.log();
    assert!(log.contains("TEST(NoCompileSample, NCTEST_A) took 0.500000 secs."));
    assert!(!log.contains("NCTEST_B"));
    assert!(!log.contains("DISABLED_NCTEST_D"));

    let stats = log.lines().last().unwrap();
    assert!(stats.starts_with("TEST(NoCompileSample): Started "));
    assert!(stats.ends_with(
        "Total 1.750000s, Extract 0.010000s, Compile 1.490000s, Process 0.250000s"
    ));
}

#[test]
fn test_persist_writes_both_files_on_sanity_pass() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let summary = summary(vec![passed("NCTEST_A")], 0);

    let written = summary.persist(&config).unwrap();
    assert_eq!(written, vec![config.log_path(), config.result.clone()]);
    assert_eq!(fs::read_to_string(&config.result).unwrap(), summary.artifact());
    assert_eq!(fs::read_to_string(config.log_path()).unwrap(), summary.log());
    assert_eq!(summary.exit_code(), 0);
}

#[test]
fn test_persist_skips_artifact_on_sanity_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let summary = summary(vec![passed("NCTEST_A")], 1);

    let written = summary.persist(&config).unwrap();
    assert_eq!(written, vec![config.log_path()]);
    assert!(!config.result.exists());
    assert!(config.log_path().exists());
    assert_eq!(summary.exit_code(), 1);
}

#[test]
fn test_persist_reports_unwritable_result() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir.path().join("missing-dir"));
    let err = summary(Vec::new(), 0).persist(&config).unwrap_err();
    assert!(matches!(err, DriverError::Io { .. }));
}
