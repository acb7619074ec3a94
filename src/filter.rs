//! Ignore-path patterns for the diff engine.
//!
//! A pattern is a dotted key path. A literal pattern ignores exactly the path
//! whose dotted form equals the pattern text, so keys named `*` or `**` are
//! plain keys. A glob pattern also matches through its segments:
//!
//! - `foo` - matches literal segment "foo"
//! - `*` - matches any single path segment
//! - `**` - matches any number of path segments (including zero)
//! - `foo.bar` - matches nested path "foo.bar"
//! - `**.version` - matches "version" at any depth
//!
//! # Examples
//!
//! ```
//! use valdiff::filter::PathPattern;
//!
//! let pattern = PathPattern::literal("metadata.timestamp");
//! assert!(pattern.matches(&["metadata".to_string(), "timestamp".to_string()]));
//! assert!(!PathPattern::literal("*").matches(&["name".to_string()]));
//!
//! let pattern = PathPattern::parse("**.version");
//! assert!(pattern.matches(&["package".to_string(), "version".to_string()]));
//! ```

use crate::error::ValdiffError;

/// A single segment in a glob pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    /// Matches an exact string
    Literal(String),
    /// Matches any single path segment (*)
    SingleWildcard,
    /// Matches any number of path segments (**)
    DoubleWildcard,
}

impl PatternSegment {
    fn accepts(&self, key: &str) -> bool {
        match self {
            PatternSegment::Literal(literal) => literal == key,
            PatternSegment::SingleWildcard | PatternSegment::DoubleWildcard => true,
        }
    }
}

/// A compiled ignore path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    pub text: String,
    /// Glob segments, `None` for a literal path
    pub segments: Option<Vec<PatternSegment>>,
}

impl PathPattern {
    /// A path matched only by its exact dotted form.
    pub fn literal(path: &str) -> Self {
        Self {
            text: path.to_string(),
            segments: None,
        }
    }

    /// A glob pattern where `*` and `**` segments are wildcards.
    pub fn parse(pattern: &str) -> Self {
        let segments = pattern
            .split('.')
            .map(|s| match s {
                "**" => PatternSegment::DoubleWildcard,
                "*" => PatternSegment::SingleWildcard,
                _ => PatternSegment::Literal(s.to_string()),
            })
            .collect();
        Self {
            text: pattern.to_string(),
            segments: Some(segments),
        }
    }

    /// Like [`PathPattern::literal`], but rejects an empty path.
    pub fn try_literal(path: &str) -> Result<Self, ValdiffError> {
        if path.is_empty() {
            return Err(ValdiffError::config("ignore path must not be empty"));
        }
        Ok(Self::literal(path))
    }

    /// Like [`PathPattern::parse`], but rejects empty patterns and empty segments.
    pub fn try_parse(pattern: &str) -> Result<Self, ValdiffError> {
        if pattern.is_empty() {
            return Err(ValdiffError::config("ignore pattern must not be empty"));
        }
        if pattern.split('.').any(str::is_empty) {
            return Err(ValdiffError::config(format!(
                "ignore pattern '{}' has an empty segment",
                pattern
            )));
        }
        Ok(Self::parse(pattern))
    }

    pub fn is_glob(&self) -> bool {
        self.segments.is_some()
    }

    pub fn matches(&self, path: &[String]) -> bool {
        if path.join(".") == self.text {
            return true;
        }
        match &self.segments {
            Some(segments) => glob_match(segments, path),
            None => false,
        }
    }
}

/// Matches `path` against glob `segments`, where `**` may consume any number
/// of keys.
fn glob_match(segments: &[PatternSegment], path: &[String]) -> bool {
    match segments.split_first() {
        None => path.is_empty(),
        Some((PatternSegment::DoubleWildcard, rest)) => {
            (0..=path.len()).any(|skip| glob_match(rest, &path[skip..]))
        }
        Some((segment, rest)) => match path.split_first() {
            Some((key, tail)) => segment.accepts(key) && glob_match(rest, tail),
            None => false,
        },
    }
}
