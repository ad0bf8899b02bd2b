//! Version chain walker.
//!
//! Brings a config to a target schema version one adjacent step at a time,
//! upward or downward. Every step is committed to the config as soon as it
//! succeeds, so a failure part way leaves the config at the last version it
//! fully reached.

use tracing::{debug, info};

use crate::error::{MigrationError, MigrationResult};
use crate::spec::{apply, MigrationSpec, SpecTable, Version};
use crate::store::ConfigStore;
use crate::tree::{deep_copy_node, Node};

/// Apply a single spec to `config` and commit the result.
///
/// The config must be at `spec.version_in`; otherwise nothing is touched.
pub fn convert<C: ConfigStore + ?Sized>(
    spec: &MigrationSpec,
    config: &mut C,
) -> MigrationResult<()> {
    let found = config.version();
    if found != spec.version_in {
        return Err(MigrationError::VersionMismatch {
            expected: spec.version_in,
            found,
        });
    }

    let output = apply(spec, config.tree())?;
    config.set_tree(output);
    config.set_version(spec.version_out);

    info!(
        from = spec.version_in,
        to = spec.version_out,
        "Migrated config from v{} → v{}",
        spec.version_in,
        spec.version_out
    );
    Ok(())
}

/// The adjacent step from `current` toward `target`.
pub fn next_step(current: Version, target: Version) -> (Version, Version) {
    if current < target {
        (current, current + 1)
    } else {
        (current, current - 1)
    }
}

/// Migrate `config` to `target` using the specs in `table`.
///
/// An empty config is initialized from `defaults` at `target` without running
/// any spec. Once the target is reached, top-level keys that `defaults` does
/// not declare are dropped. Returns the version the config was at before any
/// step ran.
pub fn migrate<C: ConfigStore + ?Sized>(
    config: &mut C,
    defaults: &Node,
    target: Version,
    table: &SpecTable,
) -> MigrationResult<Version> {
    if config.tree().is_empty() {
        debug!(version = target, "Config is empty; initializing from defaults");
        config.set_tree(deep_copy_node(defaults));
        config.set_version(target);
    }

    let original = config.version();
    let mut current = original;
    while current != target {
        let (from, to) = next_step(current, target);
        let Some(spec) = table.get(from, to) else {
            return Err(MigrationError::UnsupportedConversion {
                from: original,
                to: target,
                missing: (from, to),
            });
        };
        convert(spec, config)?;
        current = config.version();
    }

    trim_to_schema(config, defaults);
    Ok(original)
}

/// Drop top-level keys that `defaults` does not declare.
fn trim_to_schema<C: ConfigStore + ?Sized>(config: &mut C, defaults: &Node) {
    let stale: Vec<String> = config
        .tree()
        .keys()
        .filter(|key| !defaults.contains_key(*key))
        .cloned()
        .collect();
    if stale.is_empty() {
        return;
    }

    debug!(keys = ?stale, "Removing keys absent from schema defaults");
    let mut tree = config.tree().clone();
    for key in &stale {
        tree.remove(key);
    }
    config.set_tree(tree);
}
