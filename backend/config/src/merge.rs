//! Cumulative tree merge.

use std::sync::Arc;

use crate::tree::{Node, Tree};

/// Merge `src` into `dest` in place.
///
/// Mappings present on both sides merge recursively; everything else in `src`
/// overwrites `dest` (as a value copy, or a deep copy when `deep_copy` is set).
/// Keys only present in `dest` are kept. Subtrees that are already the same
/// allocation are skipped.
pub fn merge(dest: &mut Node, src: &Node, deep_copy: bool) {
    for (key, value) in src {
        match (dest.get_mut(key), value) {
            (Some(Tree::Node(existing)), Tree::Node(incoming)) => {
                if !Arc::ptr_eq(existing, incoming) {
                    merge(Arc::make_mut(existing), incoming, deep_copy);
                }
            }
            _ => {
                dest.insert(key.clone(), value.copy_value(deep_copy));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node_from_json;
    use serde_json::{json, Value};

    fn node(value: Value) -> Node {
        node_from_json(value).unwrap()
    }

    #[test]
    fn merges_nested_and_overwrites_leaves() {
        let mut dest = node(json!({"a": {"x": 1, "y": 2}, "b": 1}));
        let src = node(json!({"a": {"y": 20, "z": 30}, "c": 3}));
        merge(&mut dest, &src, false);
        assert_eq!(
            dest,
            node(json!({"a": {"x": 1, "y": 20, "z": 30}, "b": 1, "c": 3}))
        );
    }

    #[test]
    fn never_deletes_destination_keys() {
        let mut dest = node(json!({"keep": {"deep": true}}));
        merge(&mut dest, &Node::new(), false);
        assert_eq!(dest, node(json!({"keep": {"deep": true}})));
    }

    #[test]
    fn merging_into_itself_is_a_no_op() {
        let mut tree = node(json!({"a": {"b": {"c": 1}}, "d": "e"}));
        let same = tree.clone();
        merge(&mut tree, &same, false);
        assert_eq!(tree, same);
        assert_eq!(tree, node(json!({"a": {"b": {"c": 1}}, "d": "e"})));
    }

    #[test]
    fn mapping_replaces_leaf() {
        let mut dest = node(json!({"a": 1}));
        merge(&mut dest, &node(json!({"a": {"b": 2}})), false);
        assert_eq!(dest, node(json!({"a": {"b": 2}})));
    }

    #[test]
    fn leaf_replaces_mapping() {
        let mut dest = node(json!({"a": {"b": 2}}));
        merge(&mut dest, &node(json!({"a": false})), false);
        assert_eq!(dest, node(json!({"a": false})));
    }

    #[test]
    fn merge_does_not_leak_into_source() {
        let mut dest = Node::new();
        let src = node(json!({"a": {"b": 1}}));
        merge(&mut dest, &src, false);
        merge(&mut dest, &node(json!({"a": {"c": 2}})), false);
        assert_eq!(src, node(json!({"a": {"b": 1}})));
        assert_eq!(dest, node(json!({"a": {"b": 1, "c": 2}})));
    }

    #[test]
    fn deep_copy_allocates_new_subtrees() {
        let mut dest = Node::new();
        let src = node(json!({"a": {"b": 1}}));
        merge(&mut dest, &src, true);
        let (Tree::Node(d), Tree::Node(s)) = (&dest["a"], &src["a"]) else {
            panic!("expected nodes");
        };
        assert!(!Arc::ptr_eq(d, s));
    }
}
