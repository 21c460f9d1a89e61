//! Data model for land/water routing
//!
//! Contains the parcels, infrastructure records and graph structures the
//! routers work on.

pub mod graph;
pub mod infrastructure;
pub mod parcel;
pub mod point;
pub mod water;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use graph::{GraphEdge, GraphNode, LandGraph};
pub use infrastructure::{Bridge, Dock, LandGroup, LandGroups};
pub use parcel::{BridgeConnection, BridgePoint, BuildingPoint, CanalPoint, Parcel, ParcelIndex};
pub use point::{LatLng, Point, PointKind, TransportMode};
pub use water::{RawWaterConnection, RawWaterGraph, RawWaterPoint, WaterLink, WaterNetwork, WaterNode};

/// Which infrastructure the land graph is built from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathfindingMode {
    /// Every declared point, built or not: a hypothetical fully built city
    #[serde(alias = "exhaustive")]
    All,
    /// Only constructed bridges and docks: the city as it can be navigated today
    #[default]
    Real,
}

impl fmt::Display for PathfindingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathfindingMode::All => f.write_str("all"),
            PathfindingMode::Real => f.write_str("real"),
        }
    }
}

/// Everything the routers are built from
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub parcels: Vec<Parcel>,
    pub bridges: Vec<Bridge>,
    pub docks: Vec<Dock>,
    pub land_groups: Vec<LandGroup>,
    pub water_graph: Option<RawWaterGraph>,
}

impl Dataset {
    pub fn from_parcels(parcels: Vec<Parcel>) -> Self {
        Self {
            parcels,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parcels.is_empty()
    }
}
