//! The persistence seam between the migration engine and its caller.

use crate::spec::Version;
use crate::tree::Node;

/// Format tag written alongside the version in config file headers.
pub const DEFAULT_FORMAT: u32 = 1;

/// Version assumed for a config that has never been written.
pub const INITIAL_VERSION: Version = 1;

/// A versioned settings tree owned by the caller.
///
/// Migration replaces the tree and the version after every committed step;
/// loading and saving stay with the implementor.
pub trait ConfigStore {
    fn version(&self) -> Version;
    fn set_version(&mut self, version: Version);
    fn tree(&self) -> &Node;
    fn set_tree(&mut self, tree: Node);
}

/// In-memory config: a version header plus the settings tree.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedConfig {
    pub version: Version,
    pub format: u32,
    pub tree: Node,
}

impl VersionedConfig {
    pub fn new(version: Version, tree: Node) -> Self {
        Self {
            version,
            format: DEFAULT_FORMAT,
            tree,
        }
    }
}

impl Default for VersionedConfig {
    fn default() -> Self {
        Self::new(INITIAL_VERSION, Node::new())
    }
}

impl ConfigStore for VersionedConfig {
    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn tree(&self) -> &Node {
        &self.tree
    }

    fn set_tree(&mut self, tree: Node) {
        self.tree = tree;
    }
}
