//! Case descriptors and their expectations.

use std::fmt;

use regex::Regex;

/// Name of the implicit case that compiles the file without any case define.
pub const SANITY_CASE_NAME: &str = "NCTEST_SANITY";

/// Case names starting with this prefix are extracted but never compiled.
pub const DISABLED_PREFIX: &str = "DISABLED_";

/// A compiled expectation pattern that remembers its source text.
#[derive(Clone, Debug)]
pub struct Pattern {
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Pattern {
            regex: Regex::new(source)?,
        })
    }

    /// The pattern text as written in the directive.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether the pattern matches anywhere in `haystack`.
    ///
    /// A trailing `$` also matches just before one final newline, so
    /// `error: foo$` accepts `...error: foo\n`.
    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
            || haystack
                .strip_suffix('\n')
                .is_some_and(|trimmed| self.regex.is_match(trimmed))
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Pattern {}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r'{}'", self.as_str())
    }
}

/// How a case's compiler invocation is judged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expectation {
    /// The compile must succeed. Only the sanity case carries this.
    ExpectSuccess,
    /// The compile must fail; its output is not inspected.
    ExpectFailureAny,
    /// The compile must fail and at least one pattern must match stdout or
    /// stderr.
    ExpectFailureMatching(Vec<Pattern>),
}

impl Expectation {
    /// Build a failure expectation from a (possibly empty) pattern list.
    pub fn failure(patterns: Vec<Pattern>) -> Self {
        if patterns.is_empty() {
            Expectation::ExpectFailureAny
        } else {
            Expectation::ExpectFailureMatching(patterns)
        }
    }

    /// Patterns attached to this expectation (empty unless matching).
    pub fn patterns(&self) -> &[Pattern] {
        match self {
            Expectation::ExpectFailureMatching(patterns) => patterns,
            Expectation::ExpectSuccess | Expectation::ExpectFailureAny => &[],
        }
    }

    /// Render the pattern list the way it appears in failure reports:
    /// `r'a', r'b'`.
    pub fn describe_patterns(&self) -> String {
        self.patterns()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One negative-compile case (or the sanity case) found in a source file.
///
/// Descriptors are immutable once extracted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaseDescriptor {
    name: String,
    suite: String,
    expectation: Expectation,
    line: Option<usize>,
}

impl CaseDescriptor {
    /// Create a descriptor for a directive found on `line` (1-based).
    pub fn new(name: String, suite: String, expectation: Expectation, line: usize) -> Self {
        CaseDescriptor {
            name,
            suite,
            expectation,
            line: Some(line),
        }
    }

    /// The mandatory sanity case for `suite`.
    pub fn sanity(suite: &str) -> Self {
        CaseDescriptor {
            name: SANITY_CASE_NAME.to_string(),
            suite: suite.to_string(),
            expectation: Expectation::ExpectSuccess,
            line: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn suite(&self) -> &str {
        &self.suite
    }

    pub fn expectation(&self) -> &Expectation {
        &self.expectation
    }

    /// Source line of the directive; `None` for the sanity case.
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn is_sanity(&self) -> bool {
        matches!(self.expectation, Expectation::ExpectSuccess)
    }

    /// Disabled cases are reported as passing without being compiled.
    pub fn is_disabled(&self) -> bool {
        self.name.starts_with(DISABLED_PREFIX)
    }
}
