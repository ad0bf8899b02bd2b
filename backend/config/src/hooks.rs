//! Named migration hooks.
//!
//! Spec documents refer to hooks by name; the registry resolves those names to
//! the functions that run them.

use std::collections::HashMap;

use anyhow::Result;

use crate::spec::{Hook, MigrationSpec};
use crate::tree::{normalize, Node, Tree};

/// Lookup table from hook name to hook function.
#[derive(Clone)]
pub struct HookRegistry {
    hooks: HashMap<String, Hook>,
}

impl HookRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            hooks: HashMap::new(),
        }
    }

    /// A registry holding the built-in hooks.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("prune_empty", prune_empty);
        registry.register("normalize", normalize_to_defaults);
        registry
    }

    /// Register `hook` under `name`, replacing any previous hook of that name.
    pub fn register(&mut self, name: impl Into<String>, hook: Hook) {
        self.hooks.insert(name.into(), hook);
    }

    pub fn get(&self, name: &str) -> Option<Hook> {
        self.hooks.get(name).copied()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.hooks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.names())
            .finish()
    }
}

/// Remove mappings that are empty, bottom-up.
pub fn prune_empty(_spec: &MigrationSpec, mut tree: Node) -> Result<Node> {
    prune_node(&mut tree);
    Ok(tree)
}

fn prune_node(node: &mut Node) {
    node.retain(|_, value| match value {
        Tree::Leaf(_) => true,
        Tree::Node(_) => {
            let child = value.make_node_mut();
            prune_node(child);
            !child.is_empty()
        }
    });
}

/// Keep only the top-level keys the spec's defaults declare, and fill the
/// ones it is missing.
pub fn normalize_to_defaults(spec: &MigrationSpec, mut tree: Node) -> Result<Node> {
    normalize(&mut tree, &spec.defaults);
    Ok(tree)
}
