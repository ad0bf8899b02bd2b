//! Wildcard-aware path mapping.
//!
//! [`map_path`] extracts every value reachable through a source pattern and
//! relocates it under a destination pattern. Patterns are `/`-separated and may
//! contain `*` segments; each `*` on the source side binds a child key that the
//! matching `*` on the destination side reuses, so both sides must carry the
//! same number of wildcards.
//!
//! The fragment is built bottom-up: a level is only attached to its parent
//! once something below it mapped, so failed branches leave no empty
//! skeleton behind while their siblings are kept.

use tracing::trace;

use crate::error::{MigrationError, MigrationResult};
use crate::path::{Segment, TreePath};
use crate::tree::{Node, Tree};

/// Map `source_path` in `source` onto `destination_path` in a fresh tree.
///
/// Under `strict`, any path that fails to resolve is an error; otherwise the
/// affected branch contributes nothing. A wildcard count mismatch is always an
/// error.
pub fn map_path(
    source: &Node,
    source_path: &str,
    destination_path: &str,
    deep_copy: bool,
    strict: bool,
) -> MigrationResult<Node> {
    PathMapper { deep_copy, strict }.map(
        source,
        &TreePath::parse(source_path),
        &TreePath::parse(destination_path),
    )
}

/// Copy and failure policy for one mapping run.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathMapper {
    pub deep_copy: bool,
    pub strict: bool,
}

impl PathMapper {
    pub fn map(&self, source: &Node, from: &TreePath, to: &TreePath) -> MigrationResult<Node> {
        if from.wildcard_count() != to.wildcard_count() {
            return Err(arity_error(from, to));
        }
        Ok(self.map_level(source, from, 0, to, 0)?.unwrap_or_default())
    }

    /// Map one wildcard level. Returns the destination fragment rooted at
    /// `pos_out`, or `None` when nothing below this level mapped.
    fn map_level(
        &self,
        node: &Node,
        from: &TreePath,
        pos_in: usize,
        to: &TreePath,
        pos_out: usize,
    ) -> MigrationResult<Option<Node>> {
        let (node, pos_in) = match resolve(node, from, pos_in) {
            Ok(found) => found,
            Err(err) => return self.miss(err).map(|_| None),
        };
        let stop_out = to.stop_index(pos_out);

        let in_last = pos_in == from.last_index();
        let out_last = stop_out == to.last_index();

        let mut level = Node::new();
        let mapped = match (&from.segments()[pos_in], &to.segments()[stop_out]) {
            (Segment::Key(key_in), Segment::Key(key_out)) => {
                self.copy_key(node, from, key_in, key_out, &mut level)?
            }
            (Segment::Wildcard, Segment::Wildcard) => match (in_last, out_last) {
                (true, true) => self.copy_children(node, &mut level),
                (true, false) => self.spread_children(node, to, stop_out, &mut level),
                (false, true) => self.gather_children(node, from, pos_in, &mut level)?,
                (false, false) => {
                    self.recurse_children(node, from, pos_in, to, stop_out, &mut level)?
                }
            },
            _ => return Err(arity_error(from, to)),
        };

        if !mapped {
            return Ok(None);
        }
        Ok(Some(wrap(level, to, pos_out, stop_out)))
    }

    /// Both patterns end in a literal key.
    fn copy_key(
        &self,
        node: &Node,
        from: &TreePath,
        key_in: &str,
        key_out: &str,
        level: &mut Node,
    ) -> MigrationResult<bool> {
        match node.get(key_in) {
            Some(value) => {
                level.insert(key_out.to_string(), value.copy_value(self.deep_copy));
                Ok(true)
            }
            None => self.miss(MigrationError::PathResolution {
                path: from.to_string(),
            }),
        }
    }

    /// Both patterns end in a wildcard: every child is copied as is.
    fn copy_children(&self, node: &Node, level: &mut Node) -> bool {
        for (key, value) in node {
            level.insert(key.clone(), value.copy_value(self.deep_copy));
        }
        !node.is_empty()
    }

    /// The source ends in a wildcard while the destination continues: each
    /// child value is placed at the destination tail under the child's key.
    fn spread_children(
        &self,
        node: &Node,
        to: &TreePath,
        stop_out: usize,
        level: &mut Node,
    ) -> bool {
        let last = to.last_index();
        let leaf_key = to.segments()[last].to_string();
        for (key, value) in node {
            let mut tail = Node::new();
            tail.insert(leaf_key.clone(), value.copy_value(self.deep_copy));
            level.insert(key.clone(), Tree::node(wrap(tail, to, stop_out + 1, last)));
        }
        !node.is_empty()
    }

    /// The destination ends in a wildcard while the source continues: each
    /// child is searched for the source tail, and hits land under the child's
    /// key.
    fn gather_children(
        &self,
        node: &Node,
        from: &TreePath,
        pos_in: usize,
        level: &mut Node,
    ) -> MigrationResult<bool> {
        let mut mapped = false;
        for (key, child) in node {
            let concrete = from.with_key_at(pos_in, key);
            match lookup(child, &concrete, pos_in + 1) {
                Ok(value) => {
                    level.insert(key.clone(), value.copy_value(self.deep_copy));
                    mapped = true;
                }
                Err(err) => {
                    self.miss(err)?;
                }
            }
        }
        Ok(mapped)
    }

    /// Both patterns continue past this wildcard: map each child separately.
    fn recurse_children(
        &self,
        node: &Node,
        from: &TreePath,
        pos_in: usize,
        to: &TreePath,
        stop_out: usize,
        level: &mut Node,
    ) -> MigrationResult<bool> {
        let mut mapped = false;
        for (key, child) in node {
            let concrete = from.with_key_at(pos_in, key);
            let Tree::Node(child) = child else {
                self.miss(MigrationError::PathResolution {
                    path: concrete.prefix_string(pos_in + 1),
                })?;
                continue;
            };
            let fragment = self.map_level(child, &concrete, pos_in + 1, to, stop_out + 1)?;
            if let Some(fragment) = fragment {
                level.insert(key.clone(), Tree::node(fragment));
                mapped = true;
            }
        }
        Ok(mapped)
    }

    /// Apply the failure policy to an unresolved path.
    fn miss(&self, err: MigrationError) -> MigrationResult<bool> {
        if self.strict {
            return Err(err);
        }
        trace!(error = %err, "Skipping unmapped branch");
        Ok(false)
    }
}

/// Walk literal segments from `pos` up to the next wildcard or the final
/// segment. Returns the node reached and the index it stopped at.
fn resolve<'a>(
    node: &'a Node,
    path: &TreePath,
    pos: usize,
) -> MigrationResult<(&'a Node, usize)> {
    let stop = path.stop_index(pos);
    let mut current = node;
    for index in pos..stop {
        let key = path.segments()[index].to_string();
        match current.get(&key) {
            Some(Tree::Node(child)) => current = &**child,
            _ => {
                return Err(MigrationError::PathResolution {
                    path: path.prefix_string(index + 1),
                })
            }
        }
    }
    Ok((current, stop))
}

/// Resolve a wildcard-free tail starting at `pos` and return the final value.
fn lookup<'a>(tree: &'a Tree, path: &TreePath, pos: usize) -> MigrationResult<&'a Tree> {
    let Tree::Node(node) = tree else {
        return Err(MigrationError::PathResolution {
            path: path.prefix_string(pos),
        });
    };
    let (end, stop) = resolve(node, path, pos)?;
    let key = path.segments()[stop].to_string();
    end.get(&key).ok_or_else(|| MigrationError::PathResolution {
        path: path.to_string(),
    })
}

/// Nest `level` under the literal destination segments in `from..to`.
fn wrap(level: Node, path: &TreePath, from: usize, to: usize) -> Node {
    path.segments()[from..to].iter().rev().fold(level, |inner, segment| {
        let mut outer = Node::new();
        outer.insert(segment.to_string(), Tree::node(inner));
        outer
    })
}

fn arity_error(from: &TreePath, to: &TreePath) -> MigrationError {
    MigrationError::WildcardArity {
        source_path: from.to_string(),
        destination_path: to.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node_from_json;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn node(value: Value) -> Node {
        node_from_json(value).unwrap()
    }

    fn lenient(source: &Node, from: &str, to: &str) -> Node {
        map_path(source, from, to, false, false).unwrap()
    }

    #[test]
    fn relocates_a_single_value() {
        let src = node(json!({"a": {"b": 1, "other": 2}}));
        assert_eq!(lenient(&src, "a/b", "c/d"), node(json!({"c": {"d": 1}})));
    }

    #[test]
    fn fan_out_and_back() {
        let src = node(json!({"a": {"x": {"v": 1}, "y": {"v": 2}}}));
        let moved = lenient(&src, "a/*", "b/*");
        assert_eq!(moved, node(json!({"b": {"x": {"v": 1}, "y": {"v": 2}}})));
        assert_eq!(lenient(&moved, "b/*", "a/*"), src);
    }

    #[test]
    fn whole_level_wildcards() {
        let src = node(json!({"a": {"x": 1, "y": {"z": 2}}}));
        assert_eq!(lenient(&src, "a/*", "*"), node(json!({"x": 1, "y": {"z": 2}})));
        assert_eq!(
            lenient(&src, "*", "root/*"),
            node(json!({"root": {"a": {"x": 1, "y": {"z": 2}}}}))
        );
    }

    #[test]
    fn spreads_children_into_longer_destination() {
        let src = node(json!({"limits": {"up": 10, "down": 20}}));
        assert_eq!(
            lenient(&src, "limits/*", "rates/*/kbps"),
            node(json!({"rates": {"up": {"kbps": 10}, "down": {"kbps": 20}}}))
        );
    }

    #[test]
    fn gathers_children_from_longer_source() {
        let src = node(json!({"rates": {
            "up": {"kbps": 10},
            "down": {"kbps": 20},
            "broken": {"mbps": 1},
            "flat": 5
        }}));
        assert_eq!(
            lenient(&src, "rates/*/kbps", "limits/*"),
            node(json!({"limits": {"up": 10, "down": 20}}))
        );
    }

    #[test]
    fn strict_gather_reports_concrete_path() {
        let src = node(json!({"rates": {"up": {"kbps": 10}, "broken": {"mbps": 1}}}));
        let err = map_path(&src, "rates/*/kbps", "limits/*", false, true).unwrap_err();
        match err {
            MigrationError::PathResolution { path } => assert_eq!(path, "rates/broken/kbps"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn nested_wildcards_prune_only_failed_siblings() {
        let src = node(json!({"a": {
            "p": {"b": {"q": {"c": 1}, "r": {"c": 2}}},
            "s": {"b": {"t": {"d": 0}}},
            "leaf": 7
        }}));
        assert_eq!(
            lenient(&src, "a/*/b/*/c", "x/*/y/*"),
            node(json!({"x": {"p": {"y": {"q": 1, "r": 2}}}}))
        );
    }

    #[test]
    fn unresolved_mapping_leaves_no_skeleton() {
        let src = node(json!({"a": {"x": {"w": 1}, "y": {"w": 2}}}));
        assert!(lenient(&src, "a/*/v", "deep/dest/*").is_empty());
        assert!(lenient(&src, "missing/key", "deep/dest/key").is_empty());
        assert!(lenient(&node(json!({"a": {}})), "a/*", "b/*").is_empty());
    }

    #[test]
    fn strict_missing_literal_fails() {
        let src = node(json!({"a": {"b": 1}}));
        let err = map_path(&src, "a/c", "x", false, true).unwrap_err();
        assert!(matches!(err, MigrationError::PathResolution { ref path } if path == "a/c"));
    }

    #[test]
    fn traversing_through_leaf_is_a_miss() {
        let src = node(json!({"a": 1}));
        assert!(lenient(&src, "a/b", "c").is_empty());
        let err = map_path(&src, "a/b", "c", false, true).unwrap_err();
        assert!(matches!(err, MigrationError::PathResolution { ref path } if path == "a"));
    }

    #[test]
    fn wildcard_mismatch_is_fatal_even_when_lenient() {
        let src = node(json!({"a": {"b": 1}}));
        let err = map_path(&src, "a/*", "b", false, false).unwrap_err();
        assert!(matches!(err, MigrationError::WildcardArity { .. }));
    }

    #[test]
    fn value_copy_shares_subtrees_deep_copy_does_not() {
        let src = node(json!({"a": {"b": {"c": 1}}}));
        let Tree::Node(original) = &src["a"] else { panic!("expected node") };

        let shallow = map_path(&src, "a", "z", false, false).unwrap();
        let Tree::Node(shared) = &shallow["z"] else { panic!("expected node") };
        assert!(Arc::ptr_eq(original, shared));

        let deep = map_path(&src, "a", "z", true, false).unwrap();
        let Tree::Node(fresh) = &deep["z"] else { panic!("expected node") };
        assert!(!Arc::ptr_eq(original, fresh));
        assert_eq!(original, fresh);
    }
}
