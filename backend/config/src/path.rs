//! Slash-delimited tree paths with wildcard segments.

use std::fmt;

/// Marker matching every child at its level.
pub const WILDCARD: &str = "*";

/// One step of a [`TreePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Wildcard,
}

impl Segment {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Segment::Wildcard)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Wildcard => f.write_str(WILDCARD),
        }
    }
}

/// Path into a settings tree, e.g. `settings/*/limit`.
///
/// Never empty: splitting `""` yields a single empty key, like any other
/// split of a string on `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreePath(Vec<Segment>);

impl TreePath {
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split('/')
                .map(|part| {
                    if part == WILDCARD {
                        Segment::Wildcard
                    } else {
                        Segment::Key(part.to_string())
                    }
                })
                .collect(),
        )
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Index of the final segment.
    #[inline]
    pub fn last_index(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.0.get(index)
    }

    /// Nesting depth: the number of separators in the raw form.
    pub fn depth(&self) -> usize {
        self.last_index()
    }

    pub fn wildcard_count(&self) -> usize {
        self.0.iter().filter(|s| s.is_wildcard()).count()
    }

    /// True for the bare `*` path.
    pub fn is_whole_tree(&self) -> bool {
        self.0.len() == 1 && self.0[0].is_wildcard()
    }

    /// Copy of this path with the segment at `index` replaced by a literal key.
    pub fn with_key_at(&self, index: usize, key: &str) -> Self {
        let mut segments = self.0.clone();
        if let Some(slot) = segments.get_mut(index) {
            *slot = Segment::Key(key.to_string());
        }
        Self(segments)
    }

    /// Raw form of the first `len` segments.
    pub fn prefix_string(&self, len: usize) -> String {
        let end = len.min(self.0.len());
        self.0[..end]
            .iter()
            .map(Segment::to_string)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// First index at or after `from` holding a wildcard or the final segment.
    pub fn stop_index(&self, from: usize) -> usize {
        let last = self.last_index();
        (from..last)
            .find(|&i| self.0[i].is_wildcard())
            .unwrap_or(last)
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prefix_string(self.0.len()))
    }
}

impl From<&str> for TreePath {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys_and_wildcards() {
        let path = TreePath::parse("settings/*/limit");
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("settings".into()),
                Segment::Wildcard,
                Segment::Key("limit".into()),
            ]
        );
        assert_eq!(path.wildcard_count(), 1);
        assert_eq!(path.depth(), 2);
        assert_eq!(path.to_string(), "settings/*/limit");
    }

    #[test]
    fn wildcard_only_inside_whole_segment() {
        let path = TreePath::parse("a*/b");
        assert_eq!(path.wildcard_count(), 0);
    }

    #[test]
    fn whole_tree_shorthand() {
        assert!(TreePath::parse("*").is_whole_tree());
        assert!(!TreePath::parse("*/x").is_whole_tree());
    }

    #[test]
    fn stop_index_finds_wildcard_or_end() {
        let path = TreePath::parse("a/b/*/c/d");
        assert_eq!(path.stop_index(0), 2);
        assert_eq!(path.stop_index(2), 2);
        assert_eq!(path.stop_index(3), 4);
        assert_eq!(TreePath::parse("x").stop_index(0), 0);
    }

    #[test]
    fn with_key_at_leaves_original_untouched() {
        let path = TreePath::parse("a/*/c");
        let concrete = path.with_key_at(1, "b");
        assert_eq!(concrete.to_string(), "a/b/c");
        assert_eq!(path.to_string(), "a/*/c");
        assert_eq!(concrete.prefix_string(2), "a/b");
    }
}
