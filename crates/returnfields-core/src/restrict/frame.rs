//! Restriction frames.

use super::pathset::PathSet;

/// Restriction state for the record currently being serialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    /// Field name this frame was entered through (record type for the root).
    pub name: String,
    /// Whether this is the bottom frame of a response.
    pub is_top_level: bool,
    /// Paths to include at and below this level.
    pub include: PathSet,
    /// Paths to exclude at and below this level.
    pub exclude: PathSet,
}

impl Frame {
    /// Create a top-level frame.
    pub fn top_level(name: impl Into<String>, include: PathSet, exclude: PathSet) -> Self {
        Self {
            name: name.into(),
            is_top_level: true,
            include,
            exclude,
        }
    }

    /// Derive the frame for the records behind relation `field`.
    pub fn descend(&self, field: &str) -> Frame {
        Frame {
            name: field.to_string(),
            is_top_level: false,
            include: self.include.truncate_for_child(field),
            exclude: self.exclude.truncate_for_child(field),
        }
    }

    /// Check if `field` survives pruning at this level.
    pub fn admits(&self, field: &str) -> bool {
        self.include.selects(field) && !self.exclude.contains_exact(field)
    }
}

/// Stack of frames mirroring the nesting of a depth-first walk.
///
/// The bottom frame is the top-level frame and can never be popped, so the
/// stack is never empty. A stack belongs to one walk and is passed down the
/// call chain explicitly.
#[derive(Debug, Clone)]
pub struct FrameStack {
    frames: Vec<Frame>,
}

impl FrameStack {
    /// Start a stack from a top-level frame.
    pub fn new(root: Frame) -> Self {
        Self { frames: vec![root] }
    }

    /// The frame for the record currently being serialized.
    pub fn current(&self) -> &Frame {
        // Never empty: `pop` refuses to remove the root.
        &self.frames[self.frames.len() - 1]
    }

    /// Enter relation `field`, returning the pushed frame.
    pub fn push(&mut self, field: &str) -> &Frame {
        let child = self.current().descend(field);
        self.frames.push(child);
        self.current()
    }

    /// Leave the current relation. Returns `None` at the root.
    pub fn pop(&mut self) -> Option<Frame> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    /// Nesting depth (0 at the root).
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Field names from the root to the current frame, root excluded.
    pub fn path(&self) -> Vec<&str> {
        self.frames[1..].iter().map(|f| f.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> PathSet {
        PathSet::parse(raw, "*", "__")
    }

    #[test]
    fn test_descend() {
        let root = Frame::top_level("Article", parse("name,comments__name"), parse("comments__content"));
        let child = root.descend("comments");

        assert_eq!(child.name, "comments");
        assert!(!child.is_top_level);
        assert!(child.include.contains_exact("name"));
        assert!(child.exclude.contains_exact("content"));
        // The parent is untouched.
        assert!(root.include.contains_exact("name"));
        assert!(root.exclude.selects("comments"));
    }

    #[test]
    fn test_admits_applies_exclusion_at_current_level_only() {
        let root = Frame::top_level("Article", PathSet::all(), parse("content,comments__content"));
        assert!(!root.admits("content"));
        assert!(root.admits("comments"));
        assert!(root.admits("name"));
    }

    #[test]
    fn test_stack_push_pop() {
        let mut stack = FrameStack::new(Frame::top_level("User", parse("skills__user__id"), PathSet::empty()));
        assert_eq!(stack.depth(), 0);

        stack.push("skills");
        stack.push("user");
        assert_eq!(stack.path(), vec!["skills", "user"]);
        assert!(stack.current().include.contains_exact("id"));

        assert_eq!(stack.pop().unwrap().name, "user");
        assert_eq!(stack.pop().unwrap().name, "skills");
        assert!(stack.pop().is_none());
        assert!(stack.current().is_top_level);
    }
}
