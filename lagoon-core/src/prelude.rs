pub use crate::MAX_CANDIDATE_NODES;
pub use crate::{WALKING_SPEED_KMH, WATER_SPEED_KMH};

// Re-export key components
pub use crate::geometry::{line_crosses_land, point_in_polygon, segments_intersect};
pub use crate::loading::{build_land_graph, parse_dataset, parse_parcels};
pub use crate::model::{
    Bridge, Dataset, Dock, LandGraph, LandGroup, LandGroups, LatLng, Parcel, PathfindingMode,
    Point, PointKind, RawWaterGraph, TransportMode, WaterNetwork,
};
pub use crate::routing::dijkstra::{SearchGraph, SolvedPath, WeightProfile, shortest_path};
pub use crate::routing::{PathResult, RouteStage, RoutingNetwork};
