//! HTTP front end for the lagoon routing engine

pub mod api;
pub mod config;

pub use api::router;
pub use config::{Cli, ConfigError, ServerConfig};
