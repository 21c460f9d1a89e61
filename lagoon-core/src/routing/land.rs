//! Land routing: attach raw endpoints to nearby graph nodes and solve between
//! the candidate sets.

use petgraph::graph::NodeIndex;

use super::dijkstra::{WeightProfile, shortest_path_between_sets};
use crate::MAX_CANDIDATE_NODES;
use crate::geometry::{interpolate, segments_intersect};
use crate::model::{LandGraph, LatLng, Parcel, ParcelIndex, Point, PointKind, TransportMode};

/// Spacing of the land checks along a straight walk between parcels
const LAND_SAMPLE_M: f64 = 2.0;

/// Nearest non-canal nodes to `point`, restricted to `parcel_id` when given.
/// Each candidate carries the walking distance to reach it.
pub fn candidates(graph: &LandGraph, point: &Point, parcel_id: Option<&str>) -> Vec<(NodeIndex, f64)> {
    graph.nearest_nodes(point.position(), MAX_CANDIDATE_NODES, |node| {
        node.kind != PointKind::Canal
            && parcel_id.is_none_or(|id| node.polygon_id.as_deref() == Some(id))
    })
}

/// Walking path from `start` through the graph to `end`, or `None` when the
/// candidate sets are not connected
pub fn solve(
    graph: &LandGraph,
    start: &Point,
    end: &Point,
    sources: &[(NodeIndex, f64)],
    targets: &[(NodeIndex, f64)],
    profile: &WeightProfile,
) -> Option<Vec<Point>> {
    let solved = shortest_path_between_sets(graph, sources, targets, profile)?;

    let mut path = Vec::with_capacity(solved.nodes.len() + 2);
    path.push(start.clone().with_mode(TransportMode::Walking));
    path.extend(solved.nodes.iter().map(|&idx| {
        let node = graph.node(idx);
        let mode = if node.kind == PointKind::Canal {
            TransportMode::Gondola
        } else {
            TransportMode::Walking
        };
        node.to_point().with_mode(mode)
    }));
    path.push(end.clone().with_mode(TransportMode::Walking));
    Some(path)
}

/// `true` when `a` and `b` can be joined by a straight walk inside `parcel`
pub fn walkable_straight(parcel: &Parcel, start: &Point, end: &Point) -> bool {
    let (a, b) = (start.position(), end.position());
    parcel.contains(a)
        && parcel.contains(b)
        && parcel.contains(a.midpoint(b))
        && !parcel
            .boundary_edges()
            .any(|(e1, e2)| segments_intersect(a, b, e1, e2))
}

/// `true` when the straight segment `a-b` never leaves land. Endpoints may sit
/// on a parcel boundary; every interior sample must lie inside some parcel.
pub fn walkable_over_land(a: LatLng, b: LatLng, parcels: &[Parcel], index: &ParcelIndex) -> bool {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let segments = (a.distance_to(b) / LAND_SAMPLE_M).ceil().max(2.0) as usize;
    let samples = interpolate(a, b, segments);
    samples[1..samples.len() - 1]
        .iter()
        .all(|&sample| index.containing(parcels, sample).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LatLng;

    fn l_shape() -> Parcel {
        // concave: the notch at the top right is water
        Parcel::new(
            "l",
            vec![
                LatLng::new(45.0, 12.0),
                LatLng::new(45.0, 12.002),
                LatLng::new(45.001, 12.002),
                LatLng::new(45.001, 12.001),
                LatLng::new(45.002, 12.001),
                LatLng::new(45.002, 12.0),
            ],
        )
    }

    #[test]
    fn straight_walk_inside_convex_part() {
        let parcel = l_shape();
        let a = Point::new(45.0005, 12.0002);
        let b = Point::new(45.0005, 12.0018);
        assert!(walkable_straight(&parcel, &a, &b));
    }

    #[test]
    fn straight_walk_blocked_by_notch() {
        let parcel = l_shape();
        let a = Point::new(45.0018, 12.0005);
        let b = Point::new(45.0005, 12.0018);
        assert!(!walkable_straight(&parcel, &a, &b));
    }

    #[test]
    fn walk_over_land_stops_at_the_canal() {
        let island = Parcel::new(
            "island",
            vec![
                LatLng::new(45.0, 12.003),
                LatLng::new(45.0, 12.004),
                LatLng::new(45.001, 12.004),
                LatLng::new(45.001, 12.003),
            ],
        );
        let parcels = vec![l_shape(), island];
        let index = ParcelIndex::new(&parcels);

        let inside = walkable_over_land(
            LatLng::new(45.0005, 12.0002),
            LatLng::new(45.0005, 12.0018),
            &parcels,
            &index,
        );
        let across = walkable_over_land(
            LatLng::new(45.0005, 12.0018),
            LatLng::new(45.0005, 12.0035),
            &parcels,
            &index,
        );

        assert!(inside);
        assert!(!across);
    }
}
