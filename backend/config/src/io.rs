//! Config file read/write with atomic backup rotation.
//!
//! The file holds two concatenated JSON objects: a version header
//! `{"file": <version>, "format": <format>}` followed by the settings tree.
//! Files without a header are read as version 1; a file holding only a header
//! is an empty tree at that version.

use crate::store::{VersionedConfig, DEFAULT_FORMAT, INITIAL_VERSION};
use crate::tree::{node_from_json, node_to_json};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "ltconfig.conf";

/// Number of rolling backups to keep.
const MAX_BACKUPS: usize = 5;

#[derive(Debug, Serialize, Deserialize)]
struct FileHeader {
    file: u32,
    format: u32,
}

/// Resolve the config directory.
/// Priority: `LTCONFIG_CONFIG_DIR` env > `<platform config dir>/deluge` > `./deluge`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LTCONFIG_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::config_dir() {
        Some(base) => base.join("deluge"),
        None => PathBuf::from("deluge"),
    }
}

/// Resolve the full path to the config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Parse the text of a config file.
pub fn parse_config(raw: &str) -> Result<VersionedConfig> {
    let mut objects = serde_json::Deserializer::from_str(raw).into_iter::<Value>();
    let first = match objects.next() {
        Some(value) => value.context("Failed to parse config JSON")?,
        None => return Ok(VersionedConfig::default()),
    };

    let (header, body) = match objects.next() {
        Some(body) => {
            let header: FileHeader =
                serde_json::from_value(first).context("Invalid config file header")?;
            (header, body.context("Failed to parse config body JSON")?)
        }
        None => match lone_header(&first) {
            Some(header) => (header, Value::Object(Default::default())),
            None => (
                FileHeader {
                    file: INITIAL_VERSION,
                    format: DEFAULT_FORMAT,
                },
                first,
            ),
        },
    };
    if objects.next().is_some() {
        bail!("Unexpected trailing data after config body");
    }

    let tree = node_from_json(body).context("Config body is not a settings tree")?;
    Ok(VersionedConfig {
        version: header.file,
        format: header.format,
        tree,
    })
}

/// A single object with exactly the header's keys and integer values.
fn lone_header(value: &Value) -> Option<FileHeader> {
    let object = value.as_object()?;
    if object.len() != 2 || !object.values().all(Value::is_u64) {
        return None;
    }
    serde_json::from_value(value.clone()).ok()
}

/// `path` with `suffix` appended to its file name.
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Render a config in file form.
pub fn render_config(config: &VersionedConfig) -> Result<String> {
    let header = FileHeader {
        file: config.version,
        format: config.format,
    };
    let body = node_to_json(&config.tree).context("Failed to serialize config body")?;
    Ok(format!(
        "{}\n{}\n",
        serde_json::to_string_pretty(&header)?,
        serde_json::to_string_pretty(&body)?
    ))
}

/// Load and parse the config from disk.
///
/// Returns an empty config at version 1 if the file doesn't exist (first run).
pub async fn load_config(path: &Path) -> Result<VersionedConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; starting empty");
        return Ok(VersionedConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&raw)
        .with_context(|| format!("Failed to parse config at: {}", path.display()))?;

    info!(path = %path.display(), version = config.version, "Loaded config");
    Ok(config)
}

/// Write config to disk atomically (write to temp file, rename).
///
/// Creates a rolling backup of the previous config before overwriting.
pub async fn write_config(config: &VersionedConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create config directory: {}", parent.display())
        })?;
    }

    if path.exists() {
        rotate_backups(path).await?;
    }

    let text = render_config(config)?;

    let tmp_path = sibling_path(path, ".tmp");
    fs::write(&tmp_path, text.as_bytes())
        .await
        .with_context(|| format!("Failed to write temp config: {}", tmp_path.display()))?;

    fs::rename(&tmp_path, path).await.with_context(|| {
        format!("Failed to rename temp config to: {}", path.display())
    })?;

    info!(path = %path.display(), version = config.version, "Wrote config");
    Ok(())
}

/// Backup slot `index` for the config at `path`, e.g. `ltconfig.conf.bak.2`.
pub fn backup_path(path: &Path, index: usize) -> PathBuf {
    sibling_path(path, &format!(".bak.{index}"))
}

/// Shift existing backups up one slot, dropping the oldest, then copy the
/// current file into slot 1. Failures are logged and otherwise ignored.
async fn rotate_backups(path: &Path) -> Result<()> {
    for index in (1..MAX_BACKUPS).rev() {
        let older = backup_path(path, index);
        if !older.exists() {
            continue;
        }
        let newer = backup_path(path, index + 1);
        if let Err(e) = fs::rename(&older, &newer).await {
            warn!(backup = %older.display(), error = %e, "Failed to rotate config backup");
        }
    }

    let latest = backup_path(path, 1);
    if let Err(e) = fs::copy(path, &latest).await {
        warn!(backup = %latest.display(), error = %e, "Failed to back up config");
    }
    Ok(())
}
