//! Citadel authoritative server entry point.
//!
//! Loads `config.ron` (creating it on first run), applies CLI overrides,
//! initializes logging, and serves until Ctrl-C. The config file is polled
//! while serving; movement limits are applied live.
//!
//! Run with: `cargo run -p citadel-server -- --port 7878`

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use citadel_config::{CliArgs, Config, ConfigError, default_config_dir};
use citadel_net::{CanonicalStore, CitadelServer, FrameLimits, ServerConfig, SpawnTable};
use clap::Parser;
use tracing::{error, info, warn};

/// Translates the persisted config into server settings.
fn server_config(config: &Config) -> Result<ServerConfig, ConfigError> {
    let network = &config.network;
    Ok(ServerConfig {
        bind_addr: network.socket_addr()?,
        max_connections: network.max_connections,
        frame: FrameLimits {
            max_payload_size: network.max_payload_size,
        },
        session_timeout: Duration::from_secs(network.session_timeout_secs),
        broadcast_capacity: network.broadcast_capacity,
    })
}

/// How often `config.ron` is checked for edits.
const RELOAD_INTERVAL: Duration = Duration::from_secs(5);

/// Watches `config.ron` for edits made while the server runs.
struct Reloader {
    dir: PathBuf,
    on_disk: Config,
}

impl Reloader {
    fn new(dir: PathBuf, on_disk: Config) -> Self {
        Self { dir, on_disk }
    }

    /// Rereads the file. Movement limits take effect immediately; other
    /// sections only on restart. Returns whether anything changed.
    fn poll(&mut self, canonical: &CanonicalStore) -> Result<bool, ConfigError> {
        let Some(fresh) = self.on_disk.reload(&self.dir)? else {
            return Ok(false);
        };
        if fresh.movement != self.on_disk.movement {
            canonical.set_tuning(fresh.movement);
            info!("Applied new movement limits");
        }
        if fresh.world != self.on_disk.world
            || fresh.network != self.on_disk.network
            || fresh.debug != self.on_disk.debug
        {
            warn!("Config changes outside `movement` take effect after a restart");
        }
        self.on_disk = fresh;
        Ok(true)
    }
}

/// Configured city spawns over a map-centre fallback.
fn spawn_table(config: &Config) -> SpawnTable {
    let mut table = SpawnTable::centered(&config.world);
    for (&city, &spawn) in &config.network.spawns {
        table.insert(city, spawn);
    }
    table
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);

    let on_disk = Config::load_or_create(&config_dir)?;
    let mut config = on_disk.clone();
    config.apply_cli_overrides(&args);

    citadel_log::init_logging(Some(&config));
    info!("Citadel server, config at {}", config_dir.display());

    let canonical = CanonicalStore::new(config.movement, config.world);
    let server = Arc::new(CitadelServer::new(
        server_config(&config)?,
        canonical,
        spawn_table(&config),
    ));

    let runner = Arc::clone(&server);
    let serve = tokio::spawn(async move { runner.run().await });

    let mut reloader = Reloader::new(config_dir, on_disk);
    let canonical = Arc::clone(&server.canonical);
    let watcher = tokio::spawn(async move {
        let mut interval = tokio::time::interval(RELOAD_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(err) = reloader.poll(&canonical) {
                warn!("Config reload failed: {err}");
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received, shutting down");
    server.shutdown();
    watcher.abort();

    match serve.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => {
            error!("Server stopped with error: {err}");
            Err(err.into())
        }
        Err(join_err) => Err(join_err.into()),
    }
}

#[cfg(test)]
mod tests {
    use citadel_actor::Offset;

    use super::*;

    #[test]
    fn test_server_config_from_defaults() {
        let server = server_config(&Config::default()).unwrap();
        assert_eq!(server.bind_addr, "0.0.0.0:7878".parse().unwrap());
        assert_eq!(server.frame.max_payload_size, 64 * 1024);
        assert_eq!(server.session_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_address_rejected() {
        let mut config = Config::default();
        config.network.bind_address = "localhost:1".to_string();
        assert!(server_config(&config).is_err());
    }

    #[test]
    fn test_reload_applies_movement_limits() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        let canonical = CanonicalStore::new(config.movement, config.world);
        let mut reloader = Reloader::new(dir.path().to_path_buf(), config.clone());

        assert!(!reloader.poll(&canonical).unwrap());

        let mut edited = config.clone();
        edited.movement.max_turn_delta = 8;
        edited.network.port = 9001;
        edited.save(dir.path()).unwrap();

        assert!(reloader.poll(&canonical).unwrap());
        assert_eq!(canonical.tuning().max_turn_delta, 8);
        assert!(!reloader.poll(&canonical).unwrap());
    }

    #[test]
    fn test_reload_keeps_limits_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        let canonical = CanonicalStore::new(config.movement, config.world);
        let mut reloader = Reloader::new(dir.path().to_path_buf(), config.clone());

        std::fs::write(dir.path().join("config.ron"), "{{not valid}}").unwrap();
        assert!(reloader.poll(&canonical).is_err());
        assert_eq!(canonical.tuning(), config.movement);
    }

    #[test]
    fn test_spawn_table_from_config() {
        let mut config = Config::default();
        config.network.spawns.insert(3, Offset::new(96.0, 96.0));
        let table = spawn_table(&config);
        assert_eq!(table.spawn_for(3), Offset::new(96.0, 96.0));
        assert_eq!(table.spawn_for(4), Offset::new(255.0 * 48.0, 255.0 * 48.0));
    }
}
