//! Configuration management.
//!
//! TOML-backed, serde-typed, validated on load. Sections:
//!
//! - [`ServerConfig`] - listen address and connection limits
//! - [`GameConfig`] - world generation and economy tuning
//! - [`StorageConfig`] - data persistence settings
//! - [`LoggingConfig`] - logging and debugging settings
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 10344
//! idle_timeout_secs = 300
//!
//! [game]
//! port_holds = 100
//! starting_credits = 1000
//!
//! [storage]
//! data_dir = "data"
//!
//! [logging]
//! level = "info"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::world::entity::ObjectKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            game: GameConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Idle connections are closed after this many seconds without a command.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

fn default_idle_timeout_secs() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10344,
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

/// World generation and economy tuning.
///
/// The spawn probabilities drive the geometric draw in the sector generator:
/// each kind keeps spawning while a uniform draw stays at or under its
/// probability, so expected count per sector is p/(1-p).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_spawn_probability")]
    pub star_probability: f64,
    #[serde(default = "default_spawn_probability")]
    pub planet_probability: f64,
    #[serde(default = "default_spawn_probability")]
    pub station_probability: f64,
    #[serde(default = "default_spawn_probability")]
    pub port_probability: f64,
    /// Cargo capacity a new port stocks to.
    #[serde(default = "default_port_holds")]
    pub port_holds: u32,
    /// Working capital a new port can spend buying from players.
    #[serde(default = "default_port_credits")]
    pub port_credits: i64,
    /// Cargo capacity of a newly joined player ship.
    #[serde(default = "default_ship_holds")]
    pub ship_holds: u32,
    /// Credits granted when a player joins the game.
    #[serde(default = "default_starting_credits")]
    pub starting_credits: i64,
}

fn default_spawn_probability() -> f64 {
    0.5
}

fn default_port_holds() -> u32 {
    100
}

fn default_port_credits() -> i64 {
    5000
}

fn default_ship_holds() -> u32 {
    50
}

fn default_starting_credits() -> i64 {
    1000
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            star_probability: default_spawn_probability(),
            planet_probability: default_spawn_probability(),
            station_probability: default_spawn_probability(),
            port_probability: default_spawn_probability(),
            port_holds: default_port_holds(),
            port_credits: default_port_credits(),
            ship_holds: default_ship_holds(),
            starting_credits: default_starting_credits(),
        }
    }
}

impl GameConfig {
    pub fn spawn_probability(&self, kind: ObjectKind) -> f64 {
        match kind {
            ObjectKind::Star => self.star_probability,
            ObjectKind::Planet => self.planet_probability,
            ObjectKind::Station => self.station_probability,
            ObjectKind::Port => self.port_probability,
            ObjectKind::Ship => 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| anyhow!("Invalid config file {}: {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Write a default configuration file.
    pub async fn create_default(path: &str) -> Result<Self> {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config)?;
        fs::write(path, serialized).await?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for kind in ObjectKind::SECTOR_KINDS {
            let p = self.game.spawn_probability(kind);
            // p == 1.0 would loop forever in the geometric draw.
            if !(0.0..1.0).contains(&p) {
                return Err(anyhow!(
                    "spawn probability for {:?} must be in [0, 1), got {}",
                    kind,
                    p
                ));
            }
        }
        if self.game.port_holds == 0 {
            return Err(anyhow!("port_holds must be positive"));
        }
        if self.game.starting_credits < 0 || self.game.port_credits < 0 {
            return Err(anyhow!("credit amounts cannot be negative"));
        }
        if self.server.idle_timeout_secs == 0 {
            return Err(anyhow!("idle_timeout_secs must be positive"));
        }
        Ok(())
    }
}
