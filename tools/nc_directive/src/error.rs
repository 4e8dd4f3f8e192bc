//! Extraction errors.
//!
//! Every variant is fatal: a malformed directive is a mistake by the test
//! author and the run stops before any compiler is launched.

use std::io;
use std::path::PathBuf;

use crate::literal::LiteralError;

#[derive(Debug, thiserror::Error)]
pub enum DirectiveError {
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: directive for '{name}' has no expectation comment")]
    MissingExpectation { line: usize, name: String },

    #[error("line {line}: expectation for '{name}' must be a bracketed list, found '{comment}'")]
    NotAList {
        line: usize,
        name: String,
        comment: String,
    },

    #[error("line {line}: malformed expectation list for '{name}': {source}")]
    MalformedList {
        line: usize,
        name: String,
        #[source]
        source: LiteralError,
    },

    #[error("line {line}: invalid expectation pattern for '{name}': {source}")]
    InvalidPattern {
        line: usize,
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("line {line}: case '{name}' was already declared on line {first_line}")]
    DuplicateCase {
        line: usize,
        first_line: usize,
        name: String,
    },

    #[error("line {line}: '{name}' is reserved for the sanity case")]
    ReservedName { line: usize, name: String },
}

impl DirectiveError {
    /// Source line the error points at, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            DirectiveError::Io { .. } => None,
            DirectiveError::MissingExpectation { line, .. }
            | DirectiveError::NotAList { line, .. }
            | DirectiveError::MalformedList { line, .. }
            | DirectiveError::InvalidPattern { line, .. }
            | DirectiveError::DuplicateCase { line, .. }
            | DirectiveError::ReservedName { line, .. } => Some(*line),
        }
    }
}
