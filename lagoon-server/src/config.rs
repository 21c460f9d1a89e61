use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use lagoon::{EngineConfig, PathfindingMode};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid configuration in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error(transparent)]
    Engine(#[from] lagoon::EngineError),
}

/// HTTP routing service for land parcels and canals
#[derive(Debug, Parser)]
#[command(name = "lagoon-server", version, about)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Address to listen on
    #[arg(long)]
    pub listen: Option<SocketAddr>,
    /// Pathfinding mode: all (exhaustive) or real
    #[arg(long, value_parser = parse_mode)]
    pub mode: Option<PathfindingMode>,
    /// Base URL of the parcel and infrastructure data provider
    #[arg(long)]
    pub base_url: Option<String>,
    /// Load the routing data before accepting requests
    #[arg(long)]
    pub preload: bool,
}

fn parse_mode(value: &str) -> Result<PathfindingMode, String> {
    match value.to_ascii_lowercase().as_str() {
        "all" | "exhaustive" => Ok(PathfindingMode::All),
        "real" => Ok(PathfindingMode::Real),
        other => Err(format!("unknown pathfinding mode `{other}`, expected all or real")),
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub request_timeout_secs: u64,
    pub concurrency_limit: usize,
    pub cors: bool,
    pub preload: bool,
    pub engine: EngineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            request_timeout_secs: 60,
            concurrency_limit: 256,
            cors: false,
            preload: false,
            engine: EngineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// # Errors
    ///
    /// Returns the TOML error for malformed input
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Configuration file (or defaults) with command line overrides applied
    ///
    /// # Errors
    ///
    /// Returns an error for an unreadable file or an invalid engine configuration
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(listen) = cli.listen {
            config.listen = listen;
        }
        if let Some(mode) = cli.mode {
            config.engine.mode = mode;
        }
        if let Some(base_url) = &cli.base_url {
            config.engine.provider.base_url.clone_from(base_url);
        }
        config.preload |= cli.preload;
        config.engine.validate()?;
        Ok(config)
    }
}
