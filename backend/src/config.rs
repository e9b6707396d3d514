//! Configuration management.

use anyhow::bail;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration structure that matches the TOML file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    engine: EngineConfig,
    #[serde(default)]
    transmitter: TransmitterConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerConfig {
    #[serde(default = "default_port")]
    port: u16,
    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EngineConfig {
    /// Nominal interval between fade ticks
    #[serde(default = "default_tick_interval_ms")]
    tick_interval_ms: u64,
    /// Number of output slots (1..=512)
    #[serde(default = "default_universe_size")]
    universe_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            universe_size: default_universe_size(),
        }
    }
}

/// Art-Net output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransmitterConfig {
    /// Send Art-Net at all
    #[serde(default)]
    pub enabled: bool,
    /// Destination address, unicast or broadcast
    #[serde(default = "default_artnet_target")]
    pub target: SocketAddr,
    /// Art-Net port-address (15 bits)
    #[serde(default)]
    pub universe: u16,
    /// Re-send interval when nothing changes
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
}

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            target: default_artnet_target(),
            universe: 0,
            refresh_interval_ms: default_refresh_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct LoggingConfig {
    /// Path to log file (if set, logs will be written to file in addition to stdout)
    log_file: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error)
    /// If not set, uses RUST_LOG environment variable or defaults to "info"
    log_level: Option<String>,
}

fn default_port() -> u16 {
    cuelight_types::DEFAULT_PORT
}

fn default_tick_interval_ms() -> u64 {
    25
}

fn default_universe_size() -> usize {
    cuelight_types::DEFAULT_UNIVERSE_SIZE
}

fn default_artnet_target() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], crate::transmitter::artnet::ARTNET_PORT))
}

fn default_refresh_interval_ms() -> u64 {
    1000
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,
    /// Allowed CORS origins (empty = any)
    pub cors_allowed_origins: Vec<String>,
    /// Interval between engine ticks
    pub tick_interval: Duration,
    /// Width of the output universe
    pub universe_size: usize,
    /// Art-Net output
    pub transmitter: TransmitterConfig,
    /// Path to log file (if set, logs will be written to file in addition to stdout)
    pub log_file: Option<PathBuf>,
    /// Log level (if set, overrides RUST_LOG environment variable)
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with full priority chain: CLI args > env vars > config files > defaults.
    ///
    /// Config files are searched in this order:
    /// 1. `.cuelight.toml` in current directory
    /// 2. `config.toml` in user config directory (~/.config/cuelight/ on Linux)
    ///
    /// Environment variables use the `CUELIGHT_` prefix with `__` between
    /// section and key, e.g. `CUELIGHT_ENGINE__TICK_INTERVAL_MS=10`.
    pub fn from_figment(
        port: Option<u16>,
        artnet_target: Option<SocketAddr>,
    ) -> anyhow::Result<Self> {
        let local_config = std::env::current_dir()
            .ok()
            .map(|d| d.join(".cuelight.toml"));
        let user_config = directories::ProjectDirs::from("", "", "cuelight")
            .map(|dirs| dirs.config_dir().join("config.toml"));

        // Build figment with priority: defaults < user config < local config < env vars < CLI args
        let mut figment = Figment::new().merge(Serialized::defaults(ConfigFile::default()));

        if let Some(ref path) = user_config {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        if let Some(ref path) = local_config {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        figment = figment.merge(Env::prefixed("CUELIGHT_").split("__"));

        if let Some(p) = port {
            figment = figment.merge(Serialized::default("server.port", p));
        }
        if let Some(target) = artnet_target {
            figment = figment
                .merge(Serialized::default("transmitter.target", target.to_string()))
                .merge(Serialized::default("transmitter.enabled", true));
        }

        let config_file: ConfigFile = figment.extract()?;
        Self::from_file(config_file)
    }

    fn from_file(file: ConfigFile) -> anyhow::Result<Self> {
        if file.engine.tick_interval_ms == 0 {
            bail!("engine.tick_interval_ms must be greater than zero");
        }
        if !(1..=crate::transmitter::artnet::MAX_SLOTS).contains(&file.engine.universe_size) {
            bail!(
                "engine.universe_size must be between 1 and {}, got {}",
                crate::transmitter::artnet::MAX_SLOTS,
                file.engine.universe_size
            );
        }
        if file.transmitter.universe > crate::transmitter::artnet::MAX_PORT_ADDRESS {
            bail!(
                "transmitter.universe must be at most {}, got {}",
                crate::transmitter::artnet::MAX_PORT_ADDRESS,
                file.transmitter.universe
            );
        }

        Ok(Self {
            port: file.server.port,
            cors_allowed_origins: file.server.cors_allowed_origins,
            tick_interval: Duration::from_millis(file.engine.tick_interval_ms),
            universe_size: file.engine.universe_size,
            transmitter: file.transmitter,
            log_file: file.logging.log_file,
            log_level: file.logging.log_level,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            cors_allowed_origins: Vec::new(),
            tick_interval: Duration::from_millis(default_tick_interval_ms()),
            universe_size: default_universe_size(),
            transmitter: TransmitterConfig::default(),
            log_file: None,
            log_level: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    const ENV_VARS: [&str; 4] = [
        "CUELIGHT_SERVER__PORT",
        "CUELIGHT_ENGINE__TICK_INTERVAL_MS",
        "CUELIGHT_ENGINE__UNIVERSE_SIZE",
        "CUELIGHT_TRANSMITTER__ENABLED",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    /// Run `f` with `contents` as the local config file.
    fn with_local_config<T>(contents: Option<&str>, f: impl FnOnce() -> T) -> T {
        let temp_dir = TempDir::new().unwrap();
        if let Some(contents) = contents {
            fs::write(temp_dir.path().join(".cuelight.toml"), contents).unwrap();
        }

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();
        let result = f();
        // Restore before temp_dir is dropped, ignore errors
        let _ = std::env::set_current_dir(&original_dir);
        result
    }

    #[test]
    #[serial]
    fn test_from_figment_defaults() {
        clear_env();
        let config = with_local_config(None, || Config::from_figment(None, None)).unwrap();

        assert_eq!(config.port, cuelight_types::DEFAULT_PORT);
        assert_eq!(config.tick_interval, Duration::from_millis(25));
        assert_eq!(config.universe_size, 512);
        assert!(!config.transmitter.enabled);
        assert_eq!(config.transmitter.target.port(), 6454);
        assert!(config.cors_allowed_origins.is_empty());
    }

    #[test]
    #[serial]
    fn test_from_figment_config_file() {
        clear_env();
        let config = with_local_config(
            Some(
                r#"
[server]
port = 7777
cors_allowed_origins = ["http://desk.local"]

[engine]
tick_interval_ms = 10
universe_size = 128

[transmitter]
enabled = true
target = "10.0.0.255:6454"
universe = 2

[logging]
log_level = "debug"
"#,
            ),
            || Config::from_figment(None, None),
        )
        .unwrap();

        assert_eq!(config.port, 7777);
        assert_eq!(config.cors_allowed_origins, vec!["http://desk.local"]);
        assert_eq!(config.tick_interval, Duration::from_millis(10));
        assert_eq!(config.universe_size, 128);
        assert!(config.transmitter.enabled);
        assert_eq!(config.transmitter.target, "10.0.0.255:6454".parse().unwrap());
        assert_eq!(config.transmitter.universe, 2);
        assert_eq!(config.transmitter.refresh_interval_ms, 1000);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    #[serial]
    fn test_from_figment_env_vars_override_config_file() {
        clear_env();
        std::env::set_var("CUELIGHT_SERVER__PORT", "8888");
        std::env::set_var("CUELIGHT_ENGINE__TICK_INTERVAL_MS", "40");

        let config = with_local_config(Some("[server]\nport = 7777"), || {
            Config::from_figment(None, None)
        });
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.port, 8888);
        assert_eq!(config.tick_interval, Duration::from_millis(40));
    }

    #[test]
    #[serial]
    fn test_from_figment_cli_overrides_env_and_config() {
        clear_env();
        std::env::set_var("CUELIGHT_SERVER__PORT", "8888");

        let target: SocketAddr = "192.168.1.50:6454".parse().unwrap();
        let config = with_local_config(Some("[server]\nport = 7777"), || {
            Config::from_figment(Some(9999), Some(target))
        });
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.port, 9999);
        assert!(config.transmitter.enabled);
        assert_eq!(config.transmitter.target, target);
    }

    #[test]
    #[serial]
    fn test_rejects_out_of_range_values() {
        clear_env();
        let result = with_local_config(Some("[engine]\nuniverse_size = 600"), || {
            Config::from_figment(None, None)
        });
        assert!(result.is_err());

        let result = with_local_config(Some("[engine]\ntick_interval_ms = 0"), || {
            Config::from_figment(None, None)
        });
        assert!(result.is_err());

        let result = with_local_config(Some("[transmitter]\nuniverse = 40000"), || {
            Config::from_figment(None, None)
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_default() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.transmitter, TransmitterConfig::default());
    }
}
