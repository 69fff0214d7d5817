//! # Server Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TALLY_PORT=5000                                                    │
//! │     TALLY_DB_PATH=/var/lib/tally/tally.db                              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $TALLY_CONFIG, or                                                  │
//! │     ~/.config/tally-pos/tally.toml (Linux)                             │
//! │     ~/Library/Application Support/com.tally.tally-pos/tally.toml       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     0.0.0.0:5000, ./tally.db, CORS for http://localhost:3000           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # tally.toml
//! bind_addr = "127.0.0.1"
//! port = 5000
//! database_path = "./tally.db"
//! cors_origin = "http://localhost:3000"
//! seed_sample_catalog = true
//! ```

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

// =============================================================================
// Server Config
// =============================================================================

/// Runtime settings for the HTTP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to listen on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// SQLite database file. Created on first start.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Browser origin allowed by CORS (the register front end).
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// Insert the sample catalog at startup. Existing SKUs are left alone.
    #[serde(default)]
    pub seed_sample_catalog: bool,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./tally.db")
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: default_bind_addr(),
            port: default_port(),
            database_path: default_database_path(),
            cors_origin: default_cors_origin(),
            seed_sample_catalog: false,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, `$TALLY_CONFIG`, or the platform path)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| std::env::var_os("TALLY_CONFIG").map(PathBuf::from))
            .or_else(Self::default_config_path);

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading server config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue(
                "port must be between 1 and 65535".to_string(),
            ));
        }

        if self.bind_addr.parse::<IpAddr>().is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "bind_addr must be an IP address, got: {}",
                self.bind_addr
            )));
        }

        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue(
                "database_path must not be empty".to_string(),
            ));
        }

        if !self.cors_origin.starts_with("http://") && !self.cors_origin.starts_with("https://") {
            return Err(ConfigError::InvalidValue(format!(
                "cors_origin must start with http:// or https://, got: {}",
                self.cors_origin
            )));
        }

        Ok(())
    }

    /// The socket address to bind.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("bind_addr: {}", self.bind_addr)))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("TALLY_PORT") {
            match port.parse::<u16>() {
                Ok(p) => {
                    debug!(port = p, "Overriding port from environment");
                    self.port = p;
                }
                Err(_) => warn!(value = %port, "Ignoring invalid TALLY_PORT"),
            }
        }

        if let Ok(addr) = std::env::var("TALLY_BIND_ADDR") {
            debug!(bind_addr = %addr, "Overriding bind address from environment");
            self.bind_addr = addr;
        }

        if let Ok(path) = std::env::var("TALLY_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database_path = PathBuf::from(path);
        }

        if let Ok(origin) = std::env::var("TALLY_CORS_ORIGIN") {
            self.cors_origin = origin;
        }

        if let Ok(seed) = std::env::var("TALLY_SEED_SAMPLE") {
            match seed.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.seed_sample_catalog = true,
                "0" | "false" | "no" | "off" => self.seed_sample_catalog = false,
                _ => warn!(value = %seed, "Ignoring invalid TALLY_SEED_SAMPLE"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tally", "tally-pos")
            .map(|dirs| dirs.config_dir().join("tally.toml"))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
