//! Routing across open water: walk to a dock, take the gondola through the
//! water network, walk from the arrival dock.

use log::debug;

use super::dijkstra::{WeightProfile, shortest_path};
use super::path::PathResult;
use crate::geometry::interpolate;
use crate::loading::{resolve_attachments, water_network_for};
use crate::model::{
    Dataset, LandGroups, LatLng, PathfindingMode, Point, PointKind, TransportMode, WaterNetwork,
};

/// Segments of the synthetic straight line used when no water route exists
pub const FALLBACK_SEGMENTS: usize = 10;

/// Gondola boarding place
#[derive(Debug, Clone, PartialEq)]
pub struct DockSite {
    pub id: String,
    pub parcel_id: String,
    pub position: LatLng,
}

#[derive(Debug, Clone)]
pub struct WaterOnlyRouter {
    network: WaterNetwork,
    docks: Vec<DockSite>,
}

/// How a route endpoint reaches the water
struct Access {
    /// Points from the raw endpoint up to the boarding point, in travel order
    leg: Vec<Point>,
    boarding: LatLng,
}

impl WaterOnlyRouter {
    pub fn new(network: WaterNetwork, docks: Vec<DockSite>) -> Self {
        Self { network, docks }
    }

    /// Router over the dataset's water network and the docks usable in `mode`
    pub fn build(dataset: &Dataset, mode: PathfindingMode) -> Self {
        let list_present = !dataset.docks.is_empty();
        let docks = resolve_attachments(dataset)
            .into_iter()
            .filter(|a| a.kind == PointKind::Canal && a.selected(mode, list_present))
            .map(|a| DockSite {
                id: a.node_id,
                parcel_id: a.parcel_id,
                position: a.position,
            })
            .collect();
        Self::new(water_network_for(dataset), docks)
    }

    pub fn network(&self) -> &WaterNetwork {
        &self.network
    }

    pub fn docks(&self) -> &[DockSite] {
        &self.docks
    }

    /// Nearest dock in the parcel's land group, or the nearest anywhere
    pub fn nearest_dock(&self, position: LatLng, parcel_id: &str, groups: &LandGroups) -> Option<&DockSite> {
        let by_distance = |a: &&DockSite, b: &&DockSite| {
            a.position
                .distance_to(position)
                .total_cmp(&b.position.distance_to(position))
        };
        self.docks
            .iter()
            .filter(|dock| groups.same_group(&dock.parcel_id, parcel_id))
            .min_by(by_distance)
            .or_else(|| self.docks.iter().min_by(by_distance))
    }

    /// Water route between two endpoints. `*_parcel` is the parcel containing
    /// the endpoint, `None` for a point in open water. Never fails: without a
    /// usable dock or water path the result is a direct line flagged as fallback.
    pub fn route(
        &self,
        start: &Point,
        start_parcel: Option<&str>,
        end: &Point,
        end_parcel: Option<&str>,
        groups: &LandGroups,
    ) -> PathResult {
        match self.route_through_network(start, start_parcel, end, end_parcel, groups) {
            Some(path) => PathResult::water_only(path).with_fallback(false),
            None => direct_line(start, end),
        }
    }

    fn route_through_network(
        &self,
        start: &Point,
        start_parcel: Option<&str>,
        end: &Point,
        end_parcel: Option<&str>,
        groups: &LandGroups,
    ) -> Option<Vec<Point>> {
        let outbound = self.access(start, start_parcel, groups)?;
        let inbound = self.access(end, end_parcel, groups)?;

        let Some((from, _)) = self.network.nearest_node(outbound.boarding) else {
            debug!("Water network is empty, nothing to snap to");
            return None;
        };
        let (to, _) = self.network.nearest_node(inbound.boarding)?;

        let Some(solved) = shortest_path(&self.network, from, to, &WeightProfile::neutral()) else {
            debug!(
                "No water path between {} and {}",
                self.network.node(from).id,
                self.network.node(to).id
            );
            return None;
        };

        let mut path = outbound.leg;
        path.push(water_point(self.network.node(from).position));
        for pair in solved.nodes.windows(2) {
            if let Some(link) = self.network.link(pair[0], pair[1]) {
                path.extend(link.intermediate_points.iter().copied().map(water_point));
            }
            path.push(water_point(self.network.node(pair[1]).position));
        }
        path.extend(inbound.leg.into_iter().rev());

        Some(path)
    }

    fn access(&self, point: &Point, parcel: Option<&str>, groups: &LandGroups) -> Option<Access> {
        let Some(parcel) = parcel else {
            let boarding = point.position();
            let leg = vec![point.clone().with_mode(TransportMode::Gondola)];
            return Some(Access { leg, boarding });
        };

        let Some(dock) = self.nearest_dock(point.position(), parcel, groups) else {
            debug!("No dock available for parcel {parcel}");
            return None;
        };
        let dock_point = Point::from(dock.position)
            .with_kind(PointKind::Canal)
            .with_polygon(dock.parcel_id.clone());
        let leg = vec![
            point
                .clone()
                .with_polygon(parcel)
                .with_mode(TransportMode::Walking),
            dock_point.clone().with_mode(TransportMode::Walking),
            dock_point.with_mode(TransportMode::Gondola),
        ];
        Some(Access {
            leg,
            boarding: dock.position,
        })
    }
}

fn water_point(position: LatLng) -> Point {
    Point::from(position)
        .with_kind(PointKind::Water)
        .with_mode(TransportMode::Gondola)
}

/// Straight line between the endpoints, evenly interpolated
pub fn direct_line(start: &Point, end: &Point) -> PathResult {
    debug!(
        "Falling back to a direct line from ({}, {}) to ({}, {})",
        start.lat, start.lng, end.lat, end.lng
    );
    let positions = interpolate(start.position(), end.position(), FALLBACK_SEGMENTS);
    let last = positions.len().saturating_sub(1);
    let path = positions
        .into_iter()
        .enumerate()
        .map(|(idx, position)| {
            let point = match idx {
                0 => start.clone(),
                i if i == last => end.clone(),
                _ => water_point(position),
            };
            point.with_mode(TransportMode::Gondola)
        })
        .collect();
    PathResult::water_only(path).with_fallback(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loading::synthesize_water_network;
    use crate::model::LandGroup;

    fn dock(id: &str, parcel: &str, lat: f64) -> DockSite {
        DockSite {
            id: id.into(),
            parcel_id: parcel.into(),
            position: LatLng::new(lat, 12.0),
        }
    }

    fn channel() -> WaterNetwork {
        // a straight channel of points 100 m apart
        let positions: Vec<_> = (0..6)
            .map(|i| LatLng::new(45.0 + 0.0009 * f64::from(i), 12.0005))
            .collect();
        synthesize_water_network(&positions)
    }

    #[test]
    fn prefers_dock_in_same_land_group() {
        let router = WaterOnlyRouter::new(
            WaterNetwork::empty(),
            vec![dock("near", "other", 45.0001), dock("far", "home", 45.003)],
        );
        let groups = LandGroups::new(&[
            LandGroup {
                group_id: "g1".into(),
                lands: vec!["home".into(), "start".into()],
            },
            LandGroup {
                group_id: "g2".into(),
                lands: vec!["other".into()],
            },
        ]);

        let chosen = router.nearest_dock(LatLng::new(45.0, 12.0), "start", &groups).unwrap();
        assert_eq!(chosen.id, "far");

        let chosen = router.nearest_dock(LatLng::new(45.0, 12.0), "lonely", &LandGroups::default()).unwrap();
        assert_eq!(chosen.id, "near");
    }

    #[test]
    fn routes_dock_to_dock_through_water() {
        let router = WaterOnlyRouter::new(channel(), vec![dock("a", "p1", 45.0), dock("b", "p2", 45.0045)]);
        let start = Point::new(45.0, 11.9995);
        let end = Point::new(45.0045, 11.9995);

        let result = router.route(&start, Some("p1"), &end, Some("p2"), &LandGroups::default());

        assert!(result.success);
        assert_eq!(result.fallback, Some(false));
        assert_eq!(result.water_only, Some(true));
        assert!(result.walking_distance.unwrap() > 0.0);
        assert!(result.water_distance.unwrap() > 400.0);
        let path = result.points();
        assert_eq!(path.first().unwrap().position(), start.position());
        assert_eq!(path.last().unwrap().position(), end.position());
    }

    #[test]
    fn open_water_endpoints_skip_docks() {
        let router = WaterOnlyRouter::new(channel(), Vec::new());
        let start = Point::new(45.0, 12.0005);
        let end = Point::new(45.0045, 12.0005);

        let result = router.route(&start, None, &end, None, &LandGroups::default());

        assert_eq!(result.fallback, Some(false));
        assert!(result.walking_distance.unwrap().abs() < 1e-9);
    }

    #[test]
    fn missing_dock_degrades_to_direct_line() {
        let router = WaterOnlyRouter::new(channel(), Vec::new());
        let start = Point::new(45.0, 11.999);
        let end = Point::new(45.002, 11.999);

        let result = router.route(&start, Some("p1"), &end, None, &LandGroups::default());

        assert!(result.success);
        assert_eq!(result.fallback, Some(true));
        assert_eq!(result.points().len(), FALLBACK_SEGMENTS + 1);
    }
}
