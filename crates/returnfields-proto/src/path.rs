//! Dotted field paths.
//!
//! On the wire a path is a single token whose segments are joined by a
//! separator, two underscores by default: `skills__user__id`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default segment separator.
pub const PATH_SEPARATOR: &str = "__";

/// An ordered, case-sensitive sequence of field names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Create a path from segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a wire token with a custom separator. Empty segments are dropped,
    /// so `a____b` parses like `a__b`.
    pub fn parse_with(token: &str, separator: &str) -> Self {
        if separator.is_empty() {
            return Self::new([token]);
        }
        Self {
            segments: token
                .split(separator)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// The segments of this path.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// First segment, if any.
    pub fn head(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// Path without its first segment.
    pub fn tail(&self) -> FieldPath {
        Self {
            segments: self.segments.iter().skip(1).cloned().collect(),
        }
    }

    /// Check if the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if this path is exactly one segment equal to `name`.
    pub fn is_single(&self, name: &str) -> bool {
        self.segments.len() == 1 && self.segments[0] == name
    }

    /// Check if `prefix` is a leading run of this path's segments.
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Append a segment.
    pub fn child(&self, name: impl Into<String>) -> FieldPath {
        let mut segments = self.segments.clone();
        segments.push(name.into());
        Self { segments }
    }

    /// Join the segments with a custom separator.
    pub fn join(&self, separator: &str) -> String {
        self.segments.join(separator)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join(PATH_SEPARATOR))
    }
}

impl FromStr for FieldPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_with(s, PATH_SEPARATOR))
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        Self::parse_with(s, PATH_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let path: FieldPath = "skills__user__id".parse().unwrap();
        assert_eq!(path.segments(), &["skills", "user", "id"]);
        assert_eq!(path.head(), Some("skills"));
        assert_eq!(path.tail().to_string(), "user__id");
        assert_eq!(path.to_string(), "skills__user__id");
    }

    #[test]
    fn test_single_underscore_is_part_of_name() {
        let path = FieldPath::from("author_id");
        assert_eq!(path.len(), 1);
        assert!(path.is_single("author_id"));
    }

    #[test]
    fn test_empty_segments_dropped() {
        assert_eq!(FieldPath::from("a____b").segments(), &["a", "b"]);
        assert!(FieldPath::from("").is_empty());
        assert!(FieldPath::from("__").is_empty());
    }

    #[test]
    fn test_custom_separator() {
        let path = FieldPath::parse_with("posts.comments", ".");
        assert_eq!(path.segments(), &["posts", "comments"]);
        assert_eq!(path.join("."), "posts.comments");
    }

    #[test]
    fn test_prefix() {
        let path = FieldPath::from("order__customer__name");
        assert!(path.starts_with(&FieldPath::from("order")));
        assert!(path.starts_with(&FieldPath::from("order__customer")));
        assert!(!path.starts_with(&FieldPath::from("customer")));
        assert_eq!(FieldPath::from("order").child("id").to_string(), "order__id");
    }
}
