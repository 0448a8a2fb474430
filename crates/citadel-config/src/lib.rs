//! Configuration for the Citadel server.
//!
//! Settings persist to disk as `config.ron`. Every section defaults field by
//! field, so old files keep loading as new settings appear. Command-line flags
//! override whatever was loaded.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{Config, DebugConfig, NetworkConfig, default_config_dir};
pub use error::ConfigError;
