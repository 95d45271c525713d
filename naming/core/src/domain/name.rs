// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Composite Names
//!
//! A [`Name`] is an ordered sequence of string segments. Equality, ordering and
//! hierarchy are segment-wise; the empty name denotes the root context.
//!
//! # Parsing Rules
//!
//! - Segments are separated by `/`
//! - One leading `/` and one trailing `/` are ignored (`"/a/b/"` == `"a/b"`)
//! - `""` and `"/"` parse to the root
//! - Interior empty segments (`"a//b"`) and NUL bytes are rejected

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::errors::NamingError;

/// Separator between name segments.
pub const SEPARATOR: char = '/';

/// Hierarchical composite name.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name {
    segments: Vec<String>,
}

impl Name {
    /// The root name (no segments).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a slash-separated name.
    pub fn parse(raw: &str) -> Result<Self, NamingError> {
        if raw.contains('\0') {
            tracing::warn!(name = %raw.escape_debug(), "Rejected name containing NUL byte");
            return Err(NamingError::InvalidName(format!(
                "name contains a NUL byte: {}",
                raw.escape_debug()
            )));
        }

        let trimmed = raw.strip_prefix(SEPARATOR).unwrap_or(raw);
        let trimmed = trimmed.strip_suffix(SEPARATOR).unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for segment in trimmed.split(SEPARATOR) {
            if segment.is_empty() {
                return Err(NamingError::InvalidName(format!(
                    "name contains an empty segment: '{}'",
                    raw
                )));
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// Build a name from already-split segments.
    ///
    /// Segments may not be empty or contain the separator.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, NamingError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        for segment in &segments {
            if segment.is_empty() || segment.contains(SEPARATOR) || segment.contains('\0') {
                return Err(NamingError::InvalidName(format!(
                    "invalid name segment: '{}'",
                    segment.escape_debug()
                )));
            }
        }
        Ok(Self { segments })
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    pub fn first(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Immediate parent; `None` for the root.
    pub fn parent(&self) -> Option<Name> {
        if self.segments.is_empty() {
            return None;
        }
        Some(self.prefix(self.segments.len() - 1))
    }

    /// The first `n` segments (clamped to the name length).
    pub fn prefix(&self, n: usize) -> Name {
        let n = n.min(self.segments.len());
        Name {
            segments: self.segments[..n].to_vec(),
        }
    }

    /// Everything after the first `n` segments.
    pub fn suffix(&self, n: usize) -> Name {
        let n = n.min(self.segments.len());
        Name {
            segments: self.segments[n..].to_vec(),
        }
    }

    /// Concatenate two names.
    pub fn join(&self, other: &Name) -> Name {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Name { segments }
    }

    /// Append a single segment. The caller guarantees the segment is valid.
    pub fn child(&self, segment: &str) -> Name {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Name { segments }
    }

    /// Ancestor-or-equal test: `a/b`.starts_with(`a`) and `a`.starts_with(`a`).
    pub fn starts_with(&self, ancestor: &Name) -> bool {
        self.segments.len() >= ancestor.segments.len()
            && self.segments[..ancestor.segments.len()] == ancestor.segments[..]
    }

    /// True when `self` is the immediate parent of `other`.
    pub fn is_parent_of(&self, other: &Name) -> bool {
        other.segments.len() == self.segments.len() + 1 && other.starts_with(self)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl FromStr for Name {
    type Err = NamingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Name::parse(s)
    }
}

impl TryFrom<String> for Name {
    type Error = NamingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Name::parse(&value)
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let name = Name::parse("java/app/foo").unwrap();
        assert_eq!(name.len(), 3);
        assert_eq!(name.first(), Some("java"));
        assert_eq!(name.last(), Some("foo"));
        assert_eq!(name.to_string(), "java/app/foo");
    }

    #[test]
    fn test_parse_root_forms() {
        assert!(Name::parse("").unwrap().is_empty());
        assert!(Name::parse("/").unwrap().is_empty());
    }

    #[test]
    fn test_leading_and_trailing_separator_ignored() {
        assert_eq!(Name::parse("/a/b/").unwrap(), Name::parse("a/b").unwrap());
    }

    #[test]
    fn test_reject_empty_segment() {
        let result = Name::parse("a//b");
        assert!(matches!(result, Err(NamingError::InvalidName(_))));
    }

    #[test]
    fn test_reject_nul_byte() {
        assert!(matches!(Name::parse("a/\0/b"), Err(NamingError::InvalidName(_))));
    }

    #[test]
    fn test_hierarchy() {
        let foo = Name::parse("foo").unwrap();
        let bar = Name::parse("foo/bar").unwrap();
        let baz = Name::parse("foo/bar/baz").unwrap();

        assert!(baz.starts_with(&foo));
        assert!(baz.starts_with(&baz));
        assert!(!foo.starts_with(&bar));
        assert!(bar.is_parent_of(&baz));
        assert!(!foo.is_parent_of(&baz));
        assert_eq!(baz.parent(), Some(bar));
        assert_eq!(Name::root().parent(), None);
        assert!(baz.starts_with(&Name::root()));
    }

    #[test]
    fn test_prefix_suffix_join() {
        let name = Name::parse("a/b/c/d").unwrap();
        assert_eq!(name.prefix(2).to_string(), "a/b");
        assert_eq!(name.suffix(2).to_string(), "c/d");
        assert_eq!(name.prefix(2).join(&name.suffix(2)), name);
        assert!(name.suffix(10).is_empty());
    }

    #[test]
    fn test_from_segments_rejects_separator() {
        assert!(Name::from_segments(["a", "b/c"]).is_err());
        assert_eq!(Name::from_segments(["a", "b"]).unwrap().to_string(), "a/b");
    }

    #[test]
    fn test_serde_as_string() {
        let name = Name::parse("x/y").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"x/y\"");
        let parsed: Name = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, name);
    }
}
