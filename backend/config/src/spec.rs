//! Migration specifications and the per-step processor.
//!
//! A [`MigrationSpec`] declares how a tree at `version_in` is reshaped into a
//! tree at `version_out`. [`apply`] runs one spec over a tree; the version
//! chain in [`crate::chain`] strings specs together.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::error::{HookStage, MigrationError, MigrationResult};
use crate::mapper::PathMapper;
use crate::merge::merge;
use crate::path::TreePath;
use crate::tree::{deep_copy_node, Node};

/// Schema version of a settings tree.
pub type Version = u32;

/// Tree fixup run before or after the path mappings of a step.
pub type Hook = fn(&MigrationSpec, Node) -> anyhow::Result<Node>;

/// Declarative description of one migration step.
#[derive(Clone)]
pub struct MigrationSpec {
    pub version_in: Version,
    pub version_out: Version,
    /// Complete tree for `version_out`; fills every key the mappings leave out.
    pub defaults: Node,
    /// Unresolved source paths are errors instead of being skipped.
    pub strict: bool,
    /// Copy mapped values without sharing any structure with the input.
    pub deep_copy: bool,
    pub pre_func: Option<Hook>,
    pub post_func: Option<Hook>,
    /// `(source, destination)` path patterns, in declaration order.
    pub mapping: Vec<(String, String)>,
}

impl MigrationSpec {
    pub fn new(version_in: Version, version_out: Version) -> Self {
        Self {
            version_in,
            version_out,
            defaults: Node::new(),
            strict: false,
            deep_copy: false,
            pre_func: None,
            post_func: None,
            mapping: Vec::new(),
        }
    }

    pub fn with_defaults(mut self, defaults: Node) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn deep_copy(mut self, deep_copy: bool) -> Self {
        self.deep_copy = deep_copy;
        self
    }

    pub fn map(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.mapping.push((source.into(), destination.into()));
        self
    }

    pub fn pre(mut self, hook: Hook) -> Self {
        self.pre_func = Some(hook);
        self
    }

    pub fn post(mut self, hook: Hook) -> Self {
        self.post_func = Some(hook);
        self
    }

    /// Table key of this step.
    pub fn step(&self) -> (Version, Version) {
        (self.version_in, self.version_out)
    }

    /// True when the mapping carries the `* -> *` shorthand.
    pub fn copies_whole_tree(&self) -> bool {
        self.mapping.iter().any(|(from, to)| {
            TreePath::parse(from).is_whole_tree() && TreePath::parse(to).is_whole_tree()
        })
    }

    /// Parsed mappings, shallowest destination first. Mappings of equal
    /// destination depth keep their declaration order.
    pub fn ordered_mapping(&self) -> Vec<(TreePath, TreePath)> {
        let mut pairs: Vec<_> = self
            .mapping
            .iter()
            .map(|(from, to)| (TreePath::parse(from), TreePath::parse(to)))
            .collect();
        pairs.sort_by_key(|(_, to)| to.depth());
        pairs
    }

    fn run_hook(
        &self,
        stage: HookStage,
        hook: Option<Hook>,
        tree: Node,
    ) -> MigrationResult<Node> {
        let Some(hook) = hook else {
            return Ok(tree);
        };
        hook(self, tree).map_err(|source| MigrationError::Hook {
            stage,
            version_in: self.version_in,
            version_out: self.version_out,
            source,
        })
    }
}

impl fmt::Debug for MigrationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationSpec")
            .field("version_in", &self.version_in)
            .field("version_out", &self.version_out)
            .field("defaults", &self.defaults)
            .field("strict", &self.strict)
            .field("deep_copy", &self.deep_copy)
            .field("pre_func", &self.pre_func.is_some())
            .field("post_func", &self.post_func.is_some())
            .field("mapping", &self.mapping)
            .finish()
    }
}

/// Specs keyed by the adjacent version pair they convert between.
#[derive(Debug, Clone, Default)]
pub struct SpecTable {
    specs: BTreeMap<(Version, Version), MigrationSpec>,
}

impl SpecTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a spec under its own `(version_in, version_out)`. Returns the
    /// spec previously stored for that step, if any.
    pub fn insert(&mut self, spec: MigrationSpec) -> Option<MigrationSpec> {
        self.specs.insert(spec.step(), spec)
    }

    pub fn with(mut self, spec: MigrationSpec) -> Self {
        self.insert(spec);
        self
    }

    pub fn get(&self, version_in: Version, version_out: Version) -> Option<&MigrationSpec> {
        self.specs.get(&(version_in, version_out))
    }

    pub fn remove(&mut self, version_in: Version, version_out: Version) -> Option<MigrationSpec> {
        self.specs.remove(&(version_in, version_out))
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MigrationSpec> {
        self.specs.values()
    }

    /// Defaults declared by any spec that produces `version`.
    pub fn defaults_for(&self, version: Version) -> Option<&Node> {
        self.iter()
            .find(|spec| spec.version_out == version)
            .map(|spec| &spec.defaults)
    }
}

impl FromIterator<MigrationSpec> for SpecTable {
    fn from_iter<I: IntoIterator<Item = MigrationSpec>>(iter: I) -> Self {
        let mut table = SpecTable::new();
        for spec in iter {
            table.insert(spec);
        }
        table
    }
}

/// Run one spec over `input` and return the complete output tree.
///
/// `input` is never modified; hooks see their own copy.
pub fn apply(spec: &MigrationSpec, input: &Node) -> MigrationResult<Node> {
    let input = spec.run_hook(HookStage::Pre, spec.pre_func, input.clone())?;

    let working = if spec.mapping.is_empty() {
        Node::new()
    } else if spec.copies_whole_tree() {
        input
    } else {
        let mapper = PathMapper {
            deep_copy: spec.deep_copy,
            strict: spec.strict,
        };
        let mut working = Node::new();
        for (from, to) in spec.ordered_mapping() {
            let fragment = mapper.map(&input, &from, &to)?;
            debug!(
                from = %from,
                to = %to,
                mapped = !fragment.is_empty(),
                "Applied path mapping"
            );
            merge(&mut working, &fragment, spec.deep_copy);
        }
        working
    };

    let working = spec.run_hook(HookStage::Post, spec.post_func, working)?;

    let mut output = deep_copy_node(&spec.defaults);
    merge(&mut output, &working, spec.deep_copy);
    Ok(output)
}
