//! Scanning a source file for case directives.
//!
//! A directive is any line that starts with `#if`, `#ifdef` or `#elif` and
//! whose condition contains a token with the `NCTEST` marker. The token,
//! minus a `defined(...)` wrapper, is the case name; the trailing `//`
//! comment holds the expectation list.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashMap;

use crate::case::{CaseDescriptor, Expectation, Pattern, SANITY_CASE_NAME};
use crate::error::DirectiveError;
use crate::literal::parse_string_list;

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant")]
static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:el)?if.*\s+(\S*NCTEST\S*)\s*(//.*)?").expect("valid directive regex")
});

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant")]
static DEFINED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^defined\((.*)\)").expect("valid defined() regex"));

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant")]
static EXPECTATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^//\s*(\[.*\])").expect("valid expectation regex"));

/// Read `path` and extract its cases in file order.
///
/// The implicit sanity case is not part of the result; build it with
/// [`CaseDescriptor::sanity`].
pub fn extract_cases(path: &Path, suite: &str) -> Result<Vec<CaseDescriptor>, DirectiveError> {
    let source = std::fs::read_to_string(path).map_err(|source| DirectiveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    extract_cases_from_str(&source, suite)
}

/// Extract cases from in-memory source text.
pub fn extract_cases_from_str(
    source: &str,
    suite: &str,
) -> Result<Vec<CaseDescriptor>, DirectiveError> {
    let mut cases = Vec::new();
    let mut seen: FxHashMap<String, usize> = FxHashMap::default();

    for (index, text) in source.lines().enumerate() {
        let line = index + 1;
        let Some(captures) = DIRECTIVE_RE.captures(text) else {
            continue;
        };

        let token = captures.get(1).map_or("", |m| m.as_str());
        let name = strip_defined(token).to_string();

        if name == SANITY_CASE_NAME {
            return Err(DirectiveError::ReservedName { line, name });
        }
        if let Some(&first_line) = seen.get(&name) {
            return Err(DirectiveError::DuplicateCase {
                line,
                first_line,
                name,
            });
        }

        let Some(comment) = captures.get(2) else {
            return Err(DirectiveError::MissingExpectation { line, name });
        };
        let expectation = parse_expectation(comment.as_str(), &name, line)?;

        tracing::trace!(line, name = %name, "found no-compile directive");
        seen.insert(name.clone(), line);
        cases.push(CaseDescriptor::new(name, suite.to_string(), expectation, line));
    }

    Ok(cases)
}

/// Parse a trailing `// [...]` comment into an [`Expectation`].
///
/// `name` and `line` only feed error messages.
pub fn parse_expectation(
    comment: &str,
    name: &str,
    line: usize,
) -> Result<Expectation, DirectiveError> {
    let Some(list) = EXPECTATION_RE.captures(comment).and_then(|c| c.get(1)) else {
        return Err(DirectiveError::NotAList {
            line,
            name: name.to_string(),
            comment: comment.to_string(),
        });
    };

    let raw = parse_string_list(list.as_str()).map_err(|source| DirectiveError::MalformedList {
        line,
        name: name.to_string(),
        source,
    })?;

    let patterns = raw
        .iter()
        .map(|text| Pattern::new(text))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| DirectiveError::InvalidPattern {
            line,
            name: name.to_string(),
            source,
        })?;

    Ok(Expectation::failure(patterns))
}

/// Derive the suite name from a source path: `bind_unittest.nc` becomes
/// `NoCompileBindUnittest`.
pub fn suite_name_for(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut suite = String::from("NoCompile");
    for word in stem.split('_') {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            suite.extend(first.to_uppercase());
            suite.push_str(&chars.as_str().to_lowercase());
        }
    }
    suite
}

fn strip_defined(token: &str) -> &str {
    DEFINED_RE
        .captures(token)
        .and_then(|c| c.get(1))
        .map_or(token, |m| m.as_str())
}
