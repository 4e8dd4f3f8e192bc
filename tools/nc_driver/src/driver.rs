//! One complete run: extract, compile, judge, aggregate.

use nc_directive::{extract_cases, suite_name_for, CaseDescriptor};

use crate::clock::Stamp;
use crate::config::DriverConfig;
use crate::error::DriverError;
use crate::evaluate::{evaluate, evaluate_sanity, EvaluatedCase};
use crate::report::{artifact_header, RunSummary, StageTimings};
use crate::runner::{CaseRunner, RunningCase};
use crate::scheduler::Scheduler;

/// Run every case in `config.source` and return the summary without
/// writing anything.
///
/// The sanity case starts first. Disabled cases are judged on the spot
/// and never take a slot.
pub fn run(config: &DriverConfig) -> Result<RunSummary, DriverError> {
    let started = Stamp::now();

    let suite = suite_name_for(&config.source);
    let cases = extract_cases(&config.source, &suite).map_err(|source| DriverError::Directive {
        path: config.source.clone(),
        source,
    })?;
    let extract_done = Stamp::now();
    tracing::info!(suite = %suite, cases = cases.len(), "extracted cases");

    let header = artifact_header(&config.source);
    let header_written = Stamp::now();

    let runner = CaseRunner::new(config);
    let mut scheduler = Scheduler::new(config.parallelism, config.policy);
    let mut finished: Vec<RunningCase> = Vec::new();
    let mut evaluated: Vec<EvaluatedCase> = Vec::with_capacity(cases.len());

    let sanity = CaseDescriptor::sanity(&suite);
    finished.extend(scheduler.submit(|| runner.start(sanity))?);
    for case in cases {
        if case.is_disabled() {
            tracing::debug!(case = case.name(), "skipping disabled case");
            evaluated.push(EvaluatedCase::disabled(case));
            continue;
        }
        finished.extend(scheduler.submit(|| runner.start(case))?);
    }
    finished.extend(scheduler.drain()?);
    let compile_done = Stamp::now();
    tracing::info!(
        compiled = finished.len(),
        peak_live = scheduler.peak_live(),
        "all compiles finished"
    );

    let mut sanity_result = None;
    for case in finished {
        let case = case.collect()?;
        if case.descriptor.is_sanity() {
            sanity_result = Some(evaluate_sanity(case));
        } else {
            evaluated.push(evaluate(case));
        }
    }
    let sanity = sanity_result
        .ok_or_else(|| DriverError::Internal("sanity case never finished".to_string()))?;
    let results_processed = Stamp::now();

    let summary = RunSummary::new(
        suite,
        header,
        evaluated,
        sanity,
        StageTimings {
            started,
            extract_done,
            header_written,
            compile_done,
            results_processed,
        },
    );
    tracing::info!(
        passed = summary.passed(),
        failed = summary.failed(),
        exit_code = summary.exit_code(),
        "results processed"
    );
    Ok(summary)
}

/// [`run`], then write the log and (if the sanity compile passed) the
/// generated source.
pub fn run_and_persist(config: &DriverConfig) -> Result<RunSummary, DriverError> {
    let summary = run(config)?;
    summary.persist(config)?;
    Ok(summary)
}
