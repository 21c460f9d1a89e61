use std::sync::Arc;

use log::{debug, info};
use petgraph::graph::NodeIndex;

use super::RouteStage;
use super::dijkstra::WeightProfile;
use super::land::{candidates, solve, walkable_over_land, walkable_straight};
use super::path::PathResult;
use super::water_only::WaterOnlyRouter;
use crate::Error;
use crate::loading::build_land_graph;
use crate::model::{
    Dataset, LandGraph, LandGroups, LatLng, Parcel, ParcelIndex, PathfindingMode, Point,
    TransportMode, WaterNetwork,
};

/// Immutable routing snapshot for one pathfinding mode
#[derive(Debug)]
pub struct RoutingNetwork {
    mode: PathfindingMode,
    dataset: Arc<Dataset>,
    land_graph: LandGraph,
    water: WaterOnlyRouter,
    parcel_index: ParcelIndex,
    land_groups: LandGroups,
    profile: WeightProfile,
}

impl RoutingNetwork {
    pub fn build(dataset: Arc<Dataset>, mode: PathfindingMode) -> Self {
        let (land_graph, water) = rayon::join(
            || build_land_graph(&dataset, mode),
            || WaterOnlyRouter::build(&dataset, mode),
        );
        let parcel_index = ParcelIndex::new(&dataset.parcels);
        let land_groups = LandGroups::new(&dataset.land_groups);

        info!(
            "Routing network ({mode}): {} parcels, {} land nodes, {} water points{}, {} docks",
            dataset.parcels.len(),
            land_graph.node_count(),
            water.network().len(),
            if water.network().is_synthetic() { " (synthetic)" } else { "" },
            water.docks().len()
        );

        Self {
            mode,
            dataset,
            land_graph,
            water,
            parcel_index,
            land_groups,
            profile: WeightProfile::default(),
        }
    }

    #[must_use]
    pub fn with_profile(mut self, profile: WeightProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn mode(&self) -> PathfindingMode {
        self.mode
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn land_graph(&self) -> &LandGraph {
        &self.land_graph
    }

    pub fn water_network(&self) -> &WaterNetwork {
        self.water.network()
    }

    pub fn land_groups(&self) -> &LandGroups {
        &self.land_groups
    }

    /// Parcel containing `position`
    pub fn locate_parcel(&self, position: LatLng) -> Option<&Parcel> {
        self.parcel_index
            .containing(&self.dataset.parcels, position)
            .map(|idx| &self.dataset.parcels[idx])
    }

    /// Route between two points, see [`RoutingNetwork::route`]
    pub fn find_path(&self, start: &Point, end: &Point) -> PathResult {
        self.route(start, end).1
    }

    /// Resolves a route locally and reports the stage that produced it.
    ///
    /// Points outside every parcel or in different land groups go over water.
    /// Points sharing a parcel or a land group are routed over land, and land
    /// failures are recovered over water.
    pub fn route(&self, start: &Point, end: &Point) -> (RouteStage, PathResult) {
        if !start.is_valid() || !end.is_valid() {
            return (
                RouteStage::Failed,
                PathResult::failure("Invalid start or end coordinates"),
            );
        }
        if start.same_location(end) {
            debug!("Start and end coincide, returning a single point");
            return (
                RouteStage::Resolved,
                PathResult::from_path(vec![start.clone().with_mode(TransportMode::Walking)]),
            );
        }

        let start_parcel = self.locate_parcel(start.position());
        let end_parcel = self.locate_parcel(end.position());

        let (Some(start_parcel), Some(end_parcel)) = (start_parcel, end_parcel) else {
            debug!("Endpoint in open water, {}", RouteStage::LocalWater);
            return (
                RouteStage::LocalWater,
                self.water_route(start, start_parcel, end, end_parcel),
            );
        };

        let connected = start_parcel.id == end_parcel.id
            || self.land_groups.same_group(&start_parcel.id, &end_parcel.id);
        if !connected {
            debug!(
                "Parcels {} and {} are in different land groups, {}",
                start_parcel.id,
                end_parcel.id,
                RouteStage::LocalWater
            );
            return (
                RouteStage::LocalWater,
                self.water_route(start, Some(start_parcel), end, Some(end_parcel)),
            );
        }

        debug!("{} between {} and {}", RouteStage::LocalLand, start_parcel.id, end_parcel.id);
        match self.find_land_path(start, end) {
            Ok(path) => (RouteStage::LocalLand, PathResult::from_path(path)),
            Err(err) => {
                debug!("Land routing failed ({err}), recovering over water");
                (
                    RouteStage::LocalWater,
                    self.water_route(start, Some(start_parcel), end, Some(end_parcel)),
                )
            }
        }
    }

    /// Walking path over the land graph.
    ///
    /// Candidates are first taken from each endpoint's own parcel, then from
    /// all parcels.
    pub fn find_land_path(&self, start: &Point, end: &Point) -> Result<Vec<Point>, Error> {
        let start_parcel = self.require_parcel(start)?;
        let end_parcel = self.require_parcel(end)?;
        let start = start.clone().with_polygon(start_parcel.id.clone());
        let end = end.clone().with_polygon(end_parcel.id.clone());

        if start_parcel.id == end_parcel.id && walkable_straight(start_parcel, &start, &end) {
            return Ok(vec![
                start.with_mode(TransportMode::Walking),
                end.with_mode(TransportMode::Walking),
            ]);
        }

        let graph = &self.land_graph;
        let sources = candidates(graph, &start, Some(&start_parcel.id));
        let targets = candidates(graph, &end, Some(&end_parcel.id));
        if let Some(path) = solve(graph, &start, &end, &sources, &targets, &self.profile) {
            return Ok(path);
        }

        debug!(
            "No path between candidates of {} and {}, widening to all parcels",
            start_parcel.id, end_parcel.id
        );
        let sources = self.widened_candidates(&start, start_parcel);
        let targets = self.widened_candidates(&end, end_parcel);
        if sources.is_empty() || targets.is_empty() {
            return Err(Error::NoPointsFound);
        }
        solve(graph, &start, &end, &sources, &targets, &self.profile).ok_or_else(|| {
            Error::NoPathFound {
                from: start_parcel.id.clone(),
                to: end_parcel.id.clone(),
            }
        })
    }

    /// Water-only route regardless of where the endpoints are
    pub fn find_water_only_path(&self, start: &Point, end: &Point) -> PathResult {
        if !start.is_valid() || !end.is_valid() {
            return PathResult::failure("Invalid start or end coordinates");
        }
        let start_parcel = self.locate_parcel(start.position());
        let end_parcel = self.locate_parcel(end.position());
        self.water_route(start, start_parcel, end, end_parcel)
    }

    fn water_route(
        &self,
        start: &Point,
        start_parcel: Option<&Parcel>,
        end: &Point,
        end_parcel: Option<&Parcel>,
    ) -> PathResult {
        self.water.route(
            start,
            start_parcel.map(|p| p.id.as_str()),
            end,
            end_parcel.map(|p| p.id.as_str()),
            &self.land_groups,
        )
    }

    /// Nearest nodes in any parcel, keeping foreign ones only when the straight
    /// walk to them stays on land
    fn widened_candidates(&self, point: &Point, parcel: &Parcel) -> Vec<(NodeIndex, f64)> {
        candidates(&self.land_graph, point, None)
            .into_iter()
            .filter(|&(idx, _)| {
                let node = self.land_graph.node(idx);
                node.polygon_id.as_deref() == Some(parcel.id.as_str())
                    || walkable_over_land(
                        point.position(),
                        node.position,
                        &self.dataset.parcels,
                        &self.parcel_index,
                    )
            })
            .collect()
    }

    fn require_parcel(&self, point: &Point) -> Result<&Parcel, Error> {
        self.locate_parcel(point.position())
            .ok_or(Error::PointOutsideParcels {
                lat: point.lat,
                lng: point.lng,
            })
    }
}
