//! Normalized sets of field paths.

use std::collections::BTreeSet;

use returnfields_proto::FieldPath;

/// An immutable set of field paths plus an ALL flag.
///
/// When `matches_all` is set no individual path is consulted. Descent never
/// mutates a set; [`PathSet::truncate_for_child`] returns a new one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PathSet {
    paths: BTreeSet<FieldPath>,
    matches_all: bool,
}

impl PathSet {
    /// The empty set: selects nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The ALL set: selects everything at every depth.
    pub fn all() -> Self {
        Self {
            paths: BTreeSet::new(),
            matches_all: true,
        }
    }

    /// Build a set from already-split paths. Empty paths are ignored.
    pub fn from_paths<I: IntoIterator<Item = FieldPath>>(paths: I) -> Self {
        Self {
            paths: paths.into_iter().filter(|p| !p.is_empty()).collect(),
            matches_all: false,
        }
    }

    /// Parse a comma-separated parameter value.
    ///
    /// Tokens are trimmed and empty tokens dropped. A token equal to
    /// `all_token` sets the ALL flag; any other token is split on `separator`.
    pub fn parse(raw: &str, all_token: &str, separator: &str) -> Self {
        let mut set = Self::empty();
        for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if token == all_token {
                set.matches_all = true;
                continue;
            }
            let path = FieldPath::parse_with(token, separator);
            if !path.is_empty() {
                set.paths.insert(path);
            }
        }
        set
    }

    /// Check if the ALL flag is set.
    pub fn matches_all(&self) -> bool {
        self.matches_all
    }

    /// Check if the set selects nothing.
    pub fn is_empty(&self) -> bool {
        !self.matches_all && self.paths.is_empty()
    }

    /// Paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.paths.iter()
    }

    /// Number of explicit paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if any path starts with `name` (the whole field or something
    /// below it). Always true for ALL.
    pub fn selects(&self, name: &str) -> bool {
        self.matches_all || self.paths.iter().any(|p| p.head() == Some(name))
    }

    /// Check if `name` is present as a complete single-segment path.
    pub fn contains_exact(&self, name: &str) -> bool {
        self.paths.iter().any(|p| p.is_single(name))
    }

    /// Restrict the set to what lies below `field`.
    ///
    /// Paths starting with `field` lose that segment; all others are dropped.
    /// A path that was exactly `field` requests the whole subtree and turns
    /// into ALL for the child. ALL itself propagates unchanged.
    pub fn truncate_for_child(&self, field: &str) -> PathSet {
        if self.matches_all {
            return self.clone();
        }

        let mut child = PathSet::empty();
        for path in self.paths.iter().filter(|p| p.head() == Some(field)) {
            let rest = path.tail();
            if rest.is_empty() {
                child.matches_all = true;
            } else {
                child.paths.insert(rest);
            }
        }
        child
    }
}
