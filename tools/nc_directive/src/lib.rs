//! Directive extraction for no-compile tests.
//!
//! A no-compile source file carries one preprocessor branch per negative
//! compile case. Each branch is introduced by a directive line whose
//! condition names the case and whose trailing comment lists the compiler
//! diagnostics that count as the expected failure:
//!
//! ```text
//! #if defined(NCTEST_MOVE_ONLY_COPY)  // [r'use of deleted function']
//! #elif NCTEST_ANY_ERROR  // []
//! #elif DISABLED_NCTEST_FLAKY  // [r'invalid']
//! #endif
//! ```
//!
//! This crate turns such a file into an ordered list of [`CaseDescriptor`]s.
//! It never runs anything; launching compilers is the driver's job.

mod case;
mod error;
mod extract;
mod literal;

pub use case::{CaseDescriptor, Expectation, Pattern, DISABLED_PREFIX, SANITY_CASE_NAME};
pub use error::DirectiveError;
pub use extract::{extract_cases, extract_cases_from_str, parse_expectation, suite_name_for};
pub use literal::{parse_string_list, LiteralError};
