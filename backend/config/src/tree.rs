//! Settings tree: the generic value every migration step reads and writes.
//!
//! A tree is either a scalar leaf or a mapping of string keys to subtrees.
//! Subtrees live behind an `Arc`, so copying a tree by value shares structure
//! and mutation goes through `Arc::make_mut` (copy-on-write). `deep_copy`
//! allocates every node afresh.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A mapping level of the tree.
pub type Node = BTreeMap<String, Tree>;

/// Leaf value of a settings tree.
///
/// Integers that fit `i64` land in `Int`; larger unsigned ones in `UInt`, so
/// they survive a load and save without going through `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

/// Recursive settings value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tree {
    Leaf(Scalar),
    Node(Arc<Node>),
}

impl Tree {
    /// Wrap a mapping level.
    pub fn node(node: Node) -> Self {
        Tree::Node(Arc::new(node))
    }

    pub fn empty() -> Self {
        Tree::node(Node::new())
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Tree::Node(_))
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Tree::Node(node) => Some(node),
            Tree::Leaf(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Tree::Leaf(scalar) => Some(scalar),
            Tree::Node(_) => None,
        }
    }

    /// Mutable access to this level as a mapping.
    ///
    /// A leaf is replaced by an empty mapping first. Shared nodes are cloned
    /// before they are handed out.
    pub fn make_node_mut(&mut self) -> &mut Node {
        if let Tree::Leaf(_) = self {
            *self = Tree::empty();
        }
        match self {
            Tree::Node(node) => Arc::make_mut(node),
            Tree::Leaf(_) => unreachable!("leaf replaced above"),
        }
    }

    /// Copy with no structure shared with `self`.
    pub fn deep_copy(&self) -> Tree {
        match self {
            Tree::Leaf(scalar) => Tree::Leaf(scalar.clone()),
            Tree::Node(node) => Tree::node(deep_copy_node(node)),
        }
    }

    /// Value copy (shared subtrees) or deep copy.
    pub fn copy_value(&self, deep: bool) -> Tree {
        if deep {
            self.deep_copy()
        } else {
            self.clone()
        }
    }

    /// Number of leaves reachable from this value.
    pub fn leaf_count(&self) -> usize {
        match self {
            Tree::Leaf(_) => 1,
            Tree::Node(node) => node.values().map(Tree::leaf_count).sum(),
        }
    }
}

/// Structural equality; nodes backed by the same allocation compare equal
/// without being walked.
impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Tree::Leaf(a), Tree::Leaf(b)) => a == b,
            (Tree::Node(a), Tree::Node(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl From<Scalar> for Tree {
    fn from(scalar: Scalar) -> Self {
        Tree::Leaf(scalar)
    }
}

impl From<Node> for Tree {
    fn from(node: Node) -> Self {
        Tree::node(node)
    }
}

impl From<bool> for Tree {
    fn from(v: bool) -> Self {
        Tree::Leaf(Scalar::Bool(v))
    }
}

impl From<i64> for Tree {
    fn from(v: i64) -> Self {
        Tree::Leaf(Scalar::Int(v))
    }
}

impl From<u64> for Tree {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(v) => Tree::Leaf(Scalar::Int(v)),
            Err(_) => Tree::Leaf(Scalar::UInt(v)),
        }
    }
}

impl From<f64> for Tree {
    fn from(v: f64) -> Self {
        Tree::Leaf(Scalar::Float(v))
    }
}

impl From<&str> for Tree {
    fn from(v: &str) -> Self {
        Tree::Leaf(Scalar::Text(v.to_string()))
    }
}

impl From<String> for Tree {
    fn from(v: String) -> Self {
        Tree::Leaf(Scalar::Text(v))
    }
}

/// Deep copy of a mapping level.
pub fn deep_copy_node(node: &Node) -> Node {
    node.iter().map(|(k, v)| (k.clone(), v.deep_copy())).collect()
}

/// Convert a JSON object into a tree root.
///
/// Fails on anything that is not an object, and on `null` or arrays anywhere
/// inside it.
pub fn node_from_json(value: Value) -> Result<Node, serde_json::Error> {
    serde_json::from_value(value)
}

pub fn node_to_json(node: &Node) -> Result<Value, serde_json::Error> {
    serde_json::to_value(node)
}

/// Bring `node` to the shape of `template` at the top level.
///
/// Keys absent from the template are removed; keys missing from `node` are
/// filled with deep copies of the template's values.
pub fn normalize(node: &mut Node, template: &Node) {
    node.retain(|key, _| template.contains_key(key));
    for (key, value) in template {
        if !node.contains_key(key) {
            node.insert(key.clone(), value.deep_copy());
        }
    }
}
