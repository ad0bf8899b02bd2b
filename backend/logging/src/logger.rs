//! Structured Logger
//!
//! Wraps `tracing` to provide console output, optional JSON file output with
//! daily rotation (NDJSON), and environment-based level control.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log file name prefix inside the log directory.
const LOG_FILE_NAME: &str = "ltconfig.log";

/// Initialize the global structured logger.
///
/// `RUST_LOG` takes precedence over `level`. Console output goes to stderr so
/// stdout stays free for command output. When `log_dir` is set, a JSON layer
/// also writes to `ltconfig.log.YYYY-MM-DD` there. Calling this more than once
/// keeps the first subscriber.
pub fn init_logger<P: AsRef<Path>>(log_dir: Option<P>, level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = log_dir.map(|dir| {
        let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_NAME);
        fmt::layer()
            .json()
            .with_writer(file_appender)
            .with_ansi(false)
    });

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        init_logger(Some(dir.path()), "debug");
        init_logger(None::<&Path>, "info");
        tracing::info!(step = "1->2", "Logger initialized");
    }
}
