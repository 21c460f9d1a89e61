//! Multi-modal routing over a city of land parcels and canals.
//!
//! The crate turns parcels, bridges, docks and a precomputed water graph into
//! routing graphs and resolves walking, gondola and mixed paths between two
//! geographic points.

pub mod error;
pub mod geometry;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;

pub use error::Error;
pub use loading::{build_land_graph, parse_dataset};
pub use model::{
    Dataset, LandGraph, LandGroups, Parcel, PathfindingMode, Point, PointKind, TransportMode,
    WaterNetwork,
};
pub use routing::{PathResult, RoutingNetwork};

/// Number of graph nodes considered when attaching a raw point to the land graph
pub const MAX_CANDIDATE_NODES: usize = 10;

/// Walking speed in km/h
pub const WALKING_SPEED_KMH: f64 = 3.5;

/// Gondola speed in km/h
pub const WATER_SPEED_KMH: f64 = 10.0;
