//! Structured logging for the Citadel server.
//!
//! Console output with uptime timestamps and module paths, plus an optional
//! JSON log file. `RUST_LOG` wins over the configured level.

use std::fs::File;
use std::path::{Path, PathBuf};

use citadel_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config sets a level.
pub const DEFAULT_FILTER: &str = "info";

/// Name of the JSON log file inside the log directory.
pub const LOG_FILE: &str = "citadel.log";

/// Initialize the global tracing subscriber.
///
/// The filter comes from `RUST_LOG`, then `config.debug.log_level`, then
/// [`DEFAULT_FILTER`]. When `config.debug.log_dir` is set and writable, a JSON
/// layer writes to [`LOG_FILE`] inside it.
///
/// # Examples
///
/// ```no_run
/// use citadel_config::Config;
/// use citadel_log::init_logging;
///
/// init_logging(Some(&Config::default()));
/// ```
pub fn init_logging(config: Option<&Config>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_for(config)));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if let Some(log_file) = config
        .and_then(|c| c.debug.log_dir.as_deref())
        .and_then(open_log_file)
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();
        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// Filter directive for a config, falling back to [`DEFAULT_FILTER`].
pub fn filter_for(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.trim().is_empty() => {
            config.debug.log_level.clone()
        }
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Path of the JSON log file for a directory.
pub fn log_file_path(log_dir: &Path) -> PathBuf {
    log_dir.join(LOG_FILE)
}

fn open_log_file(log_dir: &Path) -> Option<File> {
    std::fs::create_dir_all(log_dir).ok()?;
    File::create(log_file_path(log_dir)).ok()
}
