//! `ltconfig-config`: versioned settings-tree migration.
//!
//! Provides:
//! - Generic settings tree with shared, copy-on-write subtrees
//! - Wildcard-aware path mapping (strict and lenient)
//! - Cumulative tree merge
//! - Declarative migration specs with pre/post hooks
//! - Version chain walker over adjacent-step spec tables
//! - Spec table validation
//! - YAML spec documents and the JSON config file format

pub mod chain;
pub mod error;
pub mod hooks;
pub mod io;
pub mod mapper;
pub mod merge;
pub mod path;
pub mod spec;
pub mod spec_file;
pub mod store;
pub mod tree;
pub mod validation;

// Re-export most-used types at crate root.
pub use chain::{convert, migrate};
pub use error::{HookStage, MigrationError, MigrationResult};
pub use hooks::HookRegistry;
pub use io::{
    backup_path, config_dir, config_file_path, load_config, parse_config, render_config,
    write_config,
};
pub use mapper::{map_path, PathMapper};
pub use merge::merge;
pub use path::{Segment, TreePath, WILDCARD};
pub use spec::{apply, Hook, MigrationSpec, SpecTable, Version};
pub use spec_file::{load_spec_file, parse_spec_document};
pub use store::{ConfigStore, VersionedConfig};
pub use tree::{node_from_json, node_to_json, normalize, Node, Scalar, Tree};
pub use validation::{missing_steps, validate, SpecValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::{info, warn};

/// Outcome of [`load_and_migrate`].
#[derive(Debug)]
pub struct MigrationOutcome {
    pub config: VersionedConfig,
    /// Version the file was at before migration.
    pub previous_version: Version,
}

/// Load a config file and migrate it to `target` with the given specs.
///
/// The table is validated first; validation errors abort before the file is
/// read. The migrated config is returned, not written.
pub async fn load_and_migrate(
    path: &Path,
    table: &SpecTable,
    target: Version,
) -> Result<MigrationOutcome> {
    let report = validate(table);
    for warning in &report.warnings {
        warn!(step = ?warning.step, message = %warning.message, "Spec warning");
    }
    if let Some(first) = report.errors.first() {
        bail!(
            "Spec table has {} error(s); first: {}",
            report.errors.len(),
            first
        );
    }

    let defaults = table
        .defaults_for(target)
        .with_context(|| format!("No spec declares defaults for v{target}"))?
        .clone();

    let mut config = load_config(path).await?;
    let previous_version = migrate(&mut config, &defaults, target, table)
        .with_context(|| format!("Failed to migrate config at: {}", path.display()))?;

    if previous_version != target {
        info!(from = previous_version, to = target, "Config migrated");
    }
    Ok(MigrationOutcome {
        config,
        previous_version,
    })
}
