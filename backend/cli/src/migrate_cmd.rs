//! CLI Migrate Command
//!
//! Loads a config file, walks it to the target version, and writes it back.

use std::path::Path;

use anyhow::Result;
use ltconfig_config::{
    load_and_migrate, load_spec_file, render_config, write_config, HookRegistry, Version,
};
use tracing::info;

use crate::terminal_output::{note_info, note_success};

pub async fn run(
    config_path: &Path,
    specs_path: &Path,
    target: Version,
    dry_run: bool,
) -> Result<()> {
    let table = load_spec_file(specs_path, &HookRegistry::with_builtins()).await?;
    let outcome = load_and_migrate(config_path, &table, target).await?;

    if dry_run {
        print!("{}", render_config(&outcome.config)?);
        note_info(&format!(
            "Dry run: v{} -> v{} not written to {}",
            outcome.previous_version,
            target,
            config_path.display()
        ));
        return Ok(());
    }

    write_config(&outcome.config, config_path).await?;
    info!(
        path = %config_path.display(),
        from = outcome.previous_version,
        to = target,
        "Config saved"
    );
    if outcome.previous_version == target {
        note_success(&format!("Config already at v{target}"));
    } else {
        note_success(&format!(
            "Migrated config v{} -> v{}",
            outcome.previous_version, target
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ltconfig_config::{backup_path, load_config, node_from_json, Tree, VersionedConfig};
    use serde_json::json;

    const SPECS: &str = "\
specs:
  - version_in: 1
    version_out: 2
    defaults: {y: 0, extra: true}
    map:
      - [x, y]
";

    async fn fixture(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf, VersionedConfig) {
        let specs = dir.join("specs.yaml");
        tokio::fs::write(&specs, SPECS).await.unwrap();
        let config_path = dir.join("ltconfig.conf");
        let original = VersionedConfig::new(1, node_from_json(json!({"x": 7})).unwrap());
        write_config(&original, &config_path).await.unwrap();
        (config_path, specs, original)
    }

    #[tokio::test]
    async fn dry_run_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let (config_path, specs, original) = fixture(dir.path()).await;

        run(&config_path, &specs, 2, true).await.unwrap();

        assert_eq!(load_config(&config_path).await.unwrap(), original);
        assert!(!backup_path(&config_path, 1).exists());
    }

    #[tokio::test]
    async fn migration_is_written_with_backup() {
        let dir = tempfile::tempdir().unwrap();
        let (config_path, specs, original) = fixture(dir.path()).await;

        run(&config_path, &specs, 2, false).await.unwrap();

        let migrated = load_config(&config_path).await.unwrap();
        assert_eq!(migrated.version, 2);
        assert_eq!(migrated.tree["y"], Tree::from(7_i64));
        assert_eq!(migrated.tree["extra"], Tree::from(true));
        assert!(!migrated.tree.contains_key("x"));
        assert_eq!(load_config(&backup_path(&config_path, 1)).await.unwrap(), original);
    }

    #[tokio::test]
    async fn unknown_target_fails_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let (config_path, specs, original) = fixture(dir.path()).await;

        assert!(run(&config_path, &specs, 3, false).await.is_err());
        assert_eq!(load_config(&config_path).await.unwrap(), original);
    }
}
