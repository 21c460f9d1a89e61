use hashbrown::HashMap;
use itertools::Itertools;
use log::{debug, info};
use petgraph::graph::NodeIndex;
use rayon::prelude::*;

use super::attachments::{Attachment, resolve_attachments};
use crate::geometry::line_crosses_land_indexed;
use crate::model::{
    Dataset, GraphNode, LandGraph, LatLng, ParcelIndex, PathfindingMode, Point, PointKind,
};

/// Bridges and canals are preferred over walking through streets
const BRIDGE_WEIGHT_FACTOR: f64 = 0.5;
/// Water travel is modeled as twice as fast as walking
const CANAL_WEIGHT_FACTOR: f64 = 0.5;
/// A bridge connection target is matched against bridge nodes within this radius
const BRIDGE_MATCH_RADIUS_M: f64 = 5.0;
/// Inter-parcel canal links are only considered within this distance band
const MIN_CANAL_LINK_M: f64 = 5.0;
const MAX_CANAL_LINK_M: f64 = 500.0;

/// Builds the land graph for `mode`
pub fn build_land_graph(dataset: &Dataset, mode: PathfindingMode) -> LandGraph {
    let attachments = resolve_attachments(dataset);
    let selected: Vec<&Attachment> = attachments
        .iter()
        .filter(|a| {
            let list_present = match a.kind {
                PointKind::Bridge => !dataset.bridges.is_empty(),
                _ => !dataset.docks.is_empty(),
            };
            a.selected(mode, list_present)
        })
        .collect();

    info!(
        "Building {mode} land graph from {} parcels and {} of {} attachment points",
        dataset.parcels.len(),
        selected.len(),
        attachments.len()
    );

    let mut graph = LandGraph::new(mode);
    let by_parcel = add_nodes(&mut graph, dataset, &selected);

    connect_within_parcels(&mut graph, &by_parcel);
    let bridges = connect_bridges(&mut graph, &selected, mode);
    let canals = connect_canals(&mut graph, dataset);

    graph.finalize();
    info!(
        "Land graph ({mode}) ready: {} nodes, {} edges ({bridges} bridge links, {canals} canal links)",
        graph.node_count(),
        graph.edge_count()
    );
    graph
}

fn add_nodes(
    graph: &mut LandGraph,
    dataset: &Dataset,
    selected: &[&Attachment],
) -> HashMap<String, Vec<NodeIndex>> {
    let mut by_parcel: HashMap<String, Vec<NodeIndex>> = HashMap::new();

    for parcel in &dataset.parcels {
        let nodes = by_parcel.entry(parcel.id.clone()).or_default();
        if let Some(center) = parcel.center {
            nodes.push(graph.add_node(GraphNode::new(
                format!("center:{}", parcel.id),
                center,
                PointKind::Center,
                Some(parcel.id.clone()),
            )));
        }
        for (idx, building) in parcel.building_points.iter().enumerate() {
            let key = building
                .id
                .clone()
                .unwrap_or_else(|| format!("{}:{idx}", parcel.id));
            nodes.push(graph.add_node(GraphNode::new(
                format!("building:{key}"),
                building.position(),
                PointKind::Building,
                Some(parcel.id.clone()),
            )));
        }
    }

    for attachment in selected {
        let idx = graph.add_node(GraphNode::new(
            attachment.node_id.clone(),
            attachment.position,
            attachment.kind,
            Some(attachment.parcel_id.clone()),
        ));
        by_parcel
            .entry(attachment.parcel_id.clone())
            .or_default()
            .push(idx);
    }

    by_parcel
}

/// Fully connects the nodes of each parcel. Canal nodes only link to canal nodes.
fn connect_within_parcels(graph: &mut LandGraph, by_parcel: &HashMap<String, Vec<NodeIndex>>) {
    for nodes in by_parcel.values() {
        for (&a, &b) in nodes.iter().tuple_combinations() {
            let (kind_a, kind_b) = (graph.node(a).kind, graph.node(b).kind);
            let canal_a = kind_a == PointKind::Canal;
            let canal_b = kind_b == PointKind::Canal;
            if canal_a != canal_b {
                continue;
            }
            let distance = graph.node(a).position.distance_to(graph.node(b).position);
            let weight = if canal_a {
                distance * CANAL_WEIGHT_FACTOR
            } else {
                distance
            };
            graph.connect(a, b, weight);
        }
    }
}

/// Links bridge nodes across parcels, returns the number of links made
fn connect_bridges(graph: &mut LandGraph, selected: &[&Attachment], mode: PathfindingMode) -> usize {
    let mut bridges_by_parcel: HashMap<&str, Vec<NodeIndex>> = HashMap::new();
    for attachment in selected.iter().filter(|a| a.kind == PointKind::Bridge) {
        if let Some(idx) = graph.node_index(&attachment.node_id) {
            bridges_by_parcel
                .entry(attachment.parcel_id.as_str())
                .or_default()
                .push(idx);
        }
    }

    let mut links = 0;
    for attachment in selected.iter().filter(|a| a.kind == PointKind::Bridge) {
        let Some(from) = graph.node_index(&attachment.node_id) else {
            continue;
        };

        if mode == PathfindingMode::Real && !attachment.links.is_empty() {
            for land in attachment
                .links
                .iter()
                .filter(|land| **land != attachment.parcel_id)
            {
                match graph.node_index(&format!("center:{land}")) {
                    Some(center) => {
                        link_bridge(graph, from, center);
                        links += 1;
                    }
                    None => debug!(
                        "Bridge {} links parcel {land} which has no center node",
                        attachment.node_id
                    ),
                }
            }
            continue;
        }

        let Some(connection) = &attachment.connection else {
            continue;
        };
        let target = bridges_by_parcel
            .get(connection.target_polygon_id.as_str())
            .and_then(|candidates| nearest_within(&*graph, candidates, connection.target_point));
        match target {
            Some(to) => {
                link_bridge(graph, from, to);
                links += 1;
            }
            None => debug!(
                "Bridge {} has no counterpart on parcel {}, skipping",
                attachment.node_id, connection.target_polygon_id
            ),
        }
    }
    links
}

fn nearest_within(graph: &LandGraph, candidates: &[NodeIndex], target: LatLng) -> Option<NodeIndex> {
    candidates
        .iter()
        .map(|&idx| (idx, graph.node(idx).position.distance_to(target)))
        .filter(|&(_, d)| d <= BRIDGE_MATCH_RADIUS_M)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(idx, _)| idx)
}

fn link_bridge(graph: &mut LandGraph, a: NodeIndex, b: NodeIndex) {
    let distance = graph.node(a).position.distance_to(graph.node(b).position);
    graph.connect(a, b, distance * BRIDGE_WEIGHT_FACTOR);
}

/// Links canal nodes of different parcels across open water, returns the
/// number of links made
fn connect_canals(graph: &mut LandGraph, dataset: &Dataset) -> usize {
    let canals: Vec<(NodeIndex, Point)> = graph
        .graph
        .node_indices()
        .filter(|&idx| graph.node(idx).kind == PointKind::Canal)
        .map(|idx| (idx, graph.node(idx).to_point()))
        .collect();
    let index = ParcelIndex::new(&dataset.parcels);

    let canals = &canals;
    let index = &index;
    let parcels = &dataset.parcels;

    let pairs: Vec<(NodeIndex, NodeIndex, f64)> = (0..canals.len())
        .into_par_iter()
        .flat_map_iter(move |i| {
            let (a, point_a) = &canals[i];
            canals[i + 1..].iter().filter_map(move |(b, point_b)| {
                if point_a.polygon_id == point_b.polygon_id {
                    return None;
                }
                let distance = point_a.distance_to(point_b);
                if !(MIN_CANAL_LINK_M..=MAX_CANAL_LINK_M).contains(&distance) {
                    return None;
                }
                if line_crosses_land_indexed(point_a, point_b, parcels, index) {
                    return None;
                }
                Some((*a, *b, distance))
            })
        })
        .collect();

    let count = pairs.len();
    for (a, b, distance) in pairs {
        graph.connect(a, b, distance * CANAL_WEIGHT_FACTOR);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BridgeConnection, BridgePoint, CanalPoint, Parcel};

    fn square(id: &str, lat: f64, lng: f64) -> Parcel {
        let size = 0.001;
        let mut parcel = Parcel::new(
            id,
            vec![
                LatLng::new(lat, lng),
                LatLng::new(lat, lng + size),
                LatLng::new(lat + size, lng + size),
                LatLng::new(lat + size, lng),
            ],
        );
        parcel.center = Some(LatLng::new(lat + size / 2.0, lng + size / 2.0));
        parcel
    }

    /// Two parcels side by side with a 0.0005 degree canal between them
    fn two_banks(constructed: Option<bool>) -> Dataset {
        let mut west = square("west", 45.0, 12.0);
        let mut east = square("east", 45.0, 12.0015);
        west.bridge_points.push(BridgePoint {
            id: Some("wb".into()),
            edge: LatLng::new(45.0005, 12.001),
            connection: Some(BridgeConnection {
                target_polygon_id: "east".into(),
                target_point: LatLng::new(45.0005, 12.0015),
                distance: None,
            }),
            is_constructed: constructed,
        });
        east.bridge_points.push(BridgePoint {
            id: Some("eb".into()),
            edge: LatLng::new(45.0005, 12.0015),
            connection: Some(BridgeConnection {
                target_polygon_id: "west".into(),
                target_point: LatLng::new(45.0005, 12.001),
                distance: None,
            }),
            is_constructed: constructed,
        });
        west.canal_points.push(CanalPoint {
            id: Some("wc".into()),
            edge: LatLng::new(45.0008, 12.001),
            is_constructed: constructed,
        });
        east.canal_points.push(CanalPoint {
            id: Some("ec".into()),
            edge: LatLng::new(45.0008, 12.0015),
            is_constructed: constructed,
        });
        Dataset::from_parcels(vec![west, east])
    }

    #[test]
    fn exhaustive_graph_links_bridges_and_canals() {
        let graph = build_land_graph(&two_banks(None), PathfindingMode::All);

        assert_eq!(graph.node_count(), 6);
        let wb = graph.node_index("bridge:wb").unwrap();
        let eb = graph.node_index("bridge:eb").unwrap();
        let crossing = graph.node(wb).position.distance_to(graph.node(eb).position);
        assert!((graph.edge_weight(wb, eb).unwrap() - crossing * 0.5).abs() < 1e-9);

        let wc = graph.node_index("canal:wc").unwrap();
        let ec = graph.node_index("canal:ec").unwrap();
        assert!(graph.edge_weight(wc, ec).is_some());
    }

    #[test]
    fn canal_nodes_only_link_to_canal_nodes_within_a_parcel() {
        let graph = build_land_graph(&two_banks(None), PathfindingMode::All);
        let wc = graph.node_index("canal:wc").unwrap();
        let center = graph.node_index("center:west").unwrap();
        let wb = graph.node_index("bridge:wb").unwrap();

        assert!(graph.edge_weight(wc, center).is_none());
        assert!(graph.edge_weight(wc, wb).is_none());
        assert!(graph.edge_weight(wb, center).is_some());
    }

    #[test]
    fn real_graph_skips_unbuilt_points() {
        let graph = build_land_graph(&two_banks(None), PathfindingMode::Real);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);

        let built = build_land_graph(&two_banks(Some(true)), PathfindingMode::Real);
        assert_eq!(built.node_count(), 6);
    }

    #[test]
    fn parcel_without_center_has_no_center_node() {
        let mut dataset = two_banks(None);
        dataset.parcels[0].center = None;
        let graph = build_land_graph(&dataset, PathfindingMode::All);
        assert!(!graph.contains("center:west"));
        assert!(graph.contains("center:east"));
    }

    #[test]
    fn real_mode_links_bridges_to_linked_centers() {
        let mut dataset = two_banks(None);
        dataset.bridges.push(crate::model::Bridge {
            building_id: "wb".into(),
            position: LatLng::new(45.0005, 12.001),
            is_constructed: true,
            links: vec!["west".into(), "east".into()],
            land_id: Some("west".into()),
        });

        let graph = build_land_graph(&dataset, PathfindingMode::Real);
        let wb = graph.node_index("bridge:wb").unwrap();
        let east_center = graph.node_index("center:east").unwrap();
        assert!(graph.edge_weight(wb, east_center).is_some());
        assert!(!graph.contains("bridge:eb"));
    }
}
