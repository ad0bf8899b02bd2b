//! CLI Map Command
//!
//! Runs one path mapping over a JSON settings file and prints the fragment.

use std::path::Path;

use anyhow::{Context, Result};
use ltconfig_config::{map_path, node_from_json, node_to_json};
use tokio::fs;

pub async fn run(input: &Path, from: &str, to: &str, strict: bool) -> Result<()> {
    let raw = fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read input: {}", input.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse input JSON: {}", input.display()))?;
    let tree = node_from_json(value).context("Input is not a settings tree")?;

    let fragment = map_path(&tree, from, to, false, strict)?;
    println!("{}", serde_json::to_string_pretty(&node_to_json(&fragment)?)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn input_file(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("settings.json");
        let raw = r#"{"torrents": {"a": {"limit": 1}, "b": {"other": 2}}}"#;
        fs::write(&path, raw).await.unwrap();
        path
    }

    #[tokio::test]
    async fn lenient_mapping_skips_missing_branches() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(dir.path()).await;
        run(&input, "torrents/*/limit", "limits/*", false).await.unwrap();
    }

    #[tokio::test]
    async fn strict_mapping_reports_missing_branch() {
        let dir = tempfile::tempdir().unwrap();
        let input = input_file(dir.path()).await;
        let err = run(&input, "torrents/*/limit", "limits/*", true).await.unwrap_err();
        assert!(err.to_string().contains("torrents/b/limit"));
    }

    #[tokio::test]
    async fn non_tree_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("list.json");
        fs::write(&input, "[1, 2]").await.unwrap();
        assert!(run(&input, "*", "*", false).await.is_err());
    }
}
