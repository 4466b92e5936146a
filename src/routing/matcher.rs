//! Path pattern matching.
//!
//! # Responsibilities
//! - Tokenize request paths into segments
//! - Parse route patterns into literal and variable segments
//! - Match a pattern against a tokenized path and extract bindings
//!
//! # Design Decisions
//! - Empty tokens are dropped, so trailing slashes are insignificant
//! - Literal matching is case-sensitive and byte-wise
//! - A variable (`:name`) matches any single non-empty segment
//! - Segment counts must be equal; there are no wildcards

use std::collections::HashMap;
use std::fmt;

/// Mapping from variable name (without the `:`) to the matched path segment.
pub type PathVars = HashMap<String, String>;

/// Prefix that marks a pattern segment as a variable.
pub const VARIABLE_PREFIX: char = ':';

/// One segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Must equal the path segment exactly.
    Literal(String),
    /// Captures the path segment under this name.
    Variable(String),
}

impl Segment {
    /// Parse a single raw segment, e.g. `account` or `:id`.
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(VARIABLE_PREFIX) {
            Some(name) => Segment::Variable(name.to_string()),
            None => Segment::Literal(raw.to_string()),
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Segment::Variable(_))
    }

    /// True when this is a literal segment equal to `segment`.
    pub fn is_literal_match(&self, segment: &str) -> bool {
        matches!(self, Segment::Literal(literal) if literal == segment)
    }

    /// Returns true if the path segment satisfies this pattern segment.
    pub fn matches(&self, segment: &str) -> bool {
        match self {
            Segment::Literal(literal) => literal == segment,
            Segment::Variable(_) => !segment.is_empty(),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(literal) => f.write_str(literal),
            Segment::Variable(name) => write!(f, "{}{}", VARIABLE_PREFIX, name),
        }
    }
}

/// A parsed route pattern such as `/account/:id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    /// Parse a `/`-delimited pattern string.
    pub fn parse(pattern: &str) -> Self {
        Self {
            segments: tokenize(pattern).into_iter().map(Segment::parse).collect(),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Match a tokenized path against this pattern.
    ///
    /// The length check runs first; a pattern never matches a path with a
    /// different number of segments.
    pub fn matches(&self, path: &[&str]) -> Option<PathVars> {
        if self.segments.len() != path.len() {
            return None;
        }

        let all_match = self
            .segments
            .iter()
            .zip(path)
            .all(|(segment, value)| segment.matches(value));

        all_match.then(|| self.bindings(path))
    }

    /// Zip the variable segments with the corresponding path segments.
    ///
    /// Assumes the path has already been matched against this pattern.
    pub fn bindings(&self, path: &[&str]) -> PathVars {
        self.segments
            .iter()
            .zip(path)
            .filter_map(|(segment, value)| match segment {
                Segment::Variable(name) => Some((name.clone(), (*value).to_string())),
                Segment::Literal(_) => None,
            })
            .collect()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// Split a path on `/`, discarding empty tokens.
pub fn tokenize(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Strip a single trailing slash, leaving the root path alone.
pub fn remove_trailing_slash(path: &str) -> &str {
    if path != "/" {
        if let Some(stripped) = path.strip_suffix('/') {
            return stripped;
        }
    }
    path
}
