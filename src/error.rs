use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Routing data unavailable: {0}")]
    DataUnavailable(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("Routing network build failed: {0}")]
    Build(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Core(#[from] lagoon_core::Error),
}
