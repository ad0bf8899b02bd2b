use std::path::PathBuf;

/// Runtime settings for the `ltconfig` binary.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding the config file when `--config` is not given
    pub config_dir: PathBuf,
    /// Directory for rotated JSON log files; console only when unset
    pub log_dir: Option<PathBuf>,
    /// Log level
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_dir: ltconfig_config::config_dir(),
            log_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self {
            config_dir: ltconfig_config::config_dir(),
            log_dir: std::env::var("LTCONFIG_LOG_DIR")
                .ok()
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            log_level: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Config file to operate on: the explicit path, or the default location.
    pub fn config_file(&self, explicit: Option<PathBuf>) -> PathBuf {
        explicit.unwrap_or_else(|| ltconfig_config::config_file_path(&self.config_dir))
    }
}
