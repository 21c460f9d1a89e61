//! Engine configuration

use std::time::Duration;

use lagoon_core::PathfindingMode;
use serde::{Deserialize, Serialize};

use crate::EngineError;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pathfinding mode active at startup
    pub mode: PathfindingMode,
    pub provider: ProviderConfig,
    /// Remote routing service used when local computation fails
    pub remote: Option<RemoteConfig>,
    pub retry: RetryPolicy,
    /// Capacity of the route event channel
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: PathfindingMode::default(),
            provider: ProviderConfig::default(),
            remote: None,
            retry: RetryPolicy::default(),
            event_capacity: 64,
        }
    }
}

impl EngineConfig {
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] for unusable values
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.event_capacity == 0 {
            return Err(EngineError::Config("event_capacity must be positive".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(EngineError::Config("retry.max_attempts must be positive".into()));
        }
        if let Some(remote) = &self.remote
            && remote.base_url.trim().is_empty()
        {
            return Err(EngineError::Config("remote.base_url is empty".into()));
        }
        Ok(())
    }
}

/// Endpoints of the parcel, bridge, dock, land group and water graph data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub parcels_path: String,
    pub bridges_path: String,
    pub docks_path: String,
    pub land_groups_path: String,
    pub water_graph_path: String,
    pub parcels_timeout_secs: u64,
    pub water_graph_timeout_secs: u64,
    /// Timeout of the remaining, smaller payloads
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".into(),
            parcels_path: "/api/v1/parcels".into(),
            bridges_path: "/api/v1/bridges".into(),
            docks_path: "/api/v1/docks".into(),
            land_groups_path: "/api/v1/land-groups".into(),
            water_graph_path: "/api/v1/water-graph".into(),
            parcels_timeout_secs: 60,
            water_graph_timeout_secs: 30,
            timeout_secs: 10,
        }
    }
}

impl ProviderConfig {
    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    pub fn parcels_timeout(&self) -> Duration {
        Duration::from_secs(self.parcels_timeout_secs)
    }

    pub fn water_graph_timeout(&self) -> Duration {
        Duration::from_secs(self.water_graph_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub route_path: String,
    pub water_only_path: String,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            route_path: "/api/v1/route".into(),
            water_only_path: "/api/v1/route/water-only".into(),
            timeout_secs: 30,
        }
    }
}

impl RemoteConfig {
    pub fn route_url(&self) -> String {
        join_url(&self.base_url, &self.route_path)
    }

    pub fn water_only_url(&self) -> String {
        join_url(&self.base_url, &self.water_only_path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
