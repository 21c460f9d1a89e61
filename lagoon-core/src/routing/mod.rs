pub mod dijkstra;
pub mod land;
pub mod network;
pub mod path;
pub mod to_geojson;
pub mod water_only;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use dijkstra::{SearchGraph, SolvedPath, WeightProfile, shortest_path, shortest_path_between_sets};
pub use network::RoutingNetwork;
pub use path::{PathResult, PathSummary};
pub use water_only::{DockSite, WaterOnlyRouter};

/// Where a route request currently is in its resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RouteStage {
    #[default]
    Idle,
    Resolving,
    LocalLand,
    LocalWater,
    RemoteFallback,
    Resolved,
    Failed,
}

impl fmt::Display for RouteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RouteStage::Idle => "idle",
            RouteStage::Resolving => "resolving",
            RouteStage::LocalLand => "local-land",
            RouteStage::LocalWater => "local-water",
            RouteStage::RemoteFallback => "remote-fallback",
            RouteStage::Resolved => "resolved",
            RouteStage::Failed => "failed",
        };
        f.write_str(name)
    }
}
