//! YAML spec documents.
//!
//! ```yaml
//! specs:
//!   - version_in: 1
//!     version_out: 2
//!     strict: false
//!     pre_func: prune_empty
//!     defaults: { apply_on_start: false, settings: {} }
//!     map:
//!       - ["settings/*", "settings/*"]
//! ```

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::info;

use crate::hooks::HookRegistry;
use crate::spec::{Hook, MigrationSpec, SpecTable, Version};
use crate::tree::Node;

/// Top level of a spec document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecDocument {
    pub specs: Vec<SpecEntry>,
}

/// One declared migration step; hooks are referenced by name.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecEntry {
    pub version_in: Version,
    pub version_out: Version,
    #[serde(default)]
    pub defaults: Node,
    #[serde(default)]
    pub strict: bool,
    #[serde(default, alias = "deep_copy")]
    pub deepcopy: bool,
    #[serde(default)]
    pub pre_func: Option<String>,
    #[serde(default)]
    pub post_func: Option<String>,
    #[serde(default)]
    pub map: Vec<(String, String)>,
}

impl SpecEntry {
    fn into_spec(self, hooks: &HookRegistry) -> Result<MigrationSpec> {
        let step = (self.version_in, self.version_out);
        let resolve = |name: Option<String>| -> Result<Option<Hook>> {
            name.map(|name| {
                hooks.get(&name).ok_or_else(|| {
                    anyhow!(
                        "Unknown hook {name:?} in spec v{}->v{} (known: {})",
                        step.0,
                        step.1,
                        hooks.names().join(", ")
                    )
                })
            })
            .transpose()
        };

        Ok(MigrationSpec {
            version_in: self.version_in,
            version_out: self.version_out,
            defaults: self.defaults,
            strict: self.strict,
            deep_copy: self.deepcopy,
            pre_func: resolve(self.pre_func)?,
            post_func: resolve(self.post_func)?,
            mapping: self.map,
        })
    }
}

/// Parse a YAML spec document into a spec table.
pub fn parse_spec_document(yaml: &str, hooks: &HookRegistry) -> Result<SpecTable> {
    let document: SpecDocument =
        serde_yaml::from_str(yaml).context("Failed to parse spec document YAML")?;

    let mut table = SpecTable::new();
    for entry in document.specs {
        let spec = entry.into_spec(hooks)?;
        let (from, to) = spec.step();
        if table.insert(spec).is_some() {
            bail!("Duplicate spec for v{from}->v{to}");
        }
    }
    Ok(table)
}

/// Read and parse a spec document from disk.
pub async fn load_spec_file(path: &Path, hooks: &HookRegistry) -> Result<SpecTable> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read spec file: {}", path.display()))?;
    let table = parse_spec_document(&raw, hooks)
        .with_context(|| format!("Invalid spec file: {}", path.display()))?;
    info!(path = %path.display(), specs = table.len(), "Loaded migration specs");
    Ok(table)
}
