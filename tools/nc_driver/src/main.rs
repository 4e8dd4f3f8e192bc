//! `nocompile`: run the no-compile cases of one source file.

use std::io::Write;
use std::process::exit;

use nc_driver::{init_tracing, run_and_persist, DriverConfig, DriverError, RunSummary, USAGE};

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map_or("nocompile", String::as_str);

    let config = match DriverConfig::from_args(args.get(1..).unwrap_or_default()) {
        Ok(config) => config,
        Err(DriverError::Usage) => {
            print_usage(program);
            exit(1);
        }
        Err(e) => {
            eprintln!("error: {e}");
            exit(1);
        }
    };

    match run_and_persist(&config) {
        Ok(summary) => {
            if !summary.sanity.passed() {
                report_sanity_failure(&summary);
            }
            exit(summary.exit_code());
        }
        Err(e) => {
            eprintln!("error: {e}");
            exit(1);
        }
    }
}

fn print_usage(program: &str) {
    println!("Usage: {program} {USAGE}");
}

/// Forward the sanity compile's output, say why it failed and dump the log.
fn report_sanity_failure(summary: &RunSummary) {
    print!("{}", summary.sanity.stdout);
    eprint!("{}", summary.sanity.stderr);
    print!("{}", summary.sanity.failure_report());
    println!(
        "No-compile driver failure with return_code {}. Result log:",
        summary.exit_code()
    );
    println!("{}", summary.log());
    let _ = std::io::stdout().flush();
}
