use hashbrown::{HashMap, HashSet};
use log::{info, warn};

use super::attachments::resolve_attachments;
use crate::geometry::polyline_length;
use crate::model::{Dataset, LatLng, PointKind, RawWaterGraph, WaterLink, WaterNetwork, WaterNode};

/// Canal points closer than this are linked when the network is synthesized
pub const SYNTHETIC_LINK_M: f64 = 200.0;

/// Water network for `dataset`: the precomputed graph when present, otherwise
/// one synthesized from every declared canal and dock position
pub fn water_network_for(dataset: &Dataset) -> WaterNetwork {
    if let Some(raw) = dataset.water_graph.as_ref().filter(|raw| !raw.water_points.is_empty()) {
        return load_water_network(raw);
    }

    let positions: Vec<LatLng> = resolve_attachments(dataset)
        .into_iter()
        .filter(|a| a.kind == PointKind::Canal)
        .map(|a| a.position)
        .collect();
    warn!(
        "No precomputed water graph, synthesizing one from {} canal points",
        positions.len()
    );
    synthesize_water_network(&positions)
}

/// Loads the precomputed graph. Connections are made bidirectional; dangling
/// targets are dropped.
pub fn load_water_network(raw: &RawWaterGraph) -> WaterNetwork {
    let mut nodes = Vec::with_capacity(raw.water_points.len());
    let mut ids: HashMap<&str, usize> = HashMap::with_capacity(raw.water_points.len());
    // raw point -> node, None for invalid or duplicate points
    let mut kept: Vec<Option<usize>> = Vec::with_capacity(raw.water_points.len());
    for point in &raw.water_points {
        if !point.position.is_valid() {
            warn!("Water point {} has an invalid position, skipping", point.id);
            kept.push(None);
            continue;
        }
        if ids.contains_key(point.id.as_str()) {
            warn!("Duplicate water point {}, keeping the first", point.id);
            kept.push(None);
            continue;
        }
        ids.insert(point.id.as_str(), nodes.len());
        kept.push(Some(nodes.len()));
        nodes.push(WaterNode {
            id: point.id.clone(),
            position: point.position,
        });
    }

    let mut links: Vec<Vec<WaterLink>> = vec![Vec::new(); nodes.len()];
    let mut present: HashSet<(usize, usize)> = HashSet::new();
    let mut dangling = 0usize;

    for (point, from) in raw.water_points.iter().zip(kept) {
        let Some(from) = from else {
            continue;
        };
        for connection in &point.connections {
            let Some(&to) = ids.get(connection.target_id.as_str()) else {
                dangling += 1;
                continue;
            };
            if from == to || !present.insert((from, to)) {
                continue;
            }
            let distance = connection
                .distance
                .filter(|d| d.is_finite() && *d > 0.0)
                .unwrap_or_else(|| {
                    path_length(nodes[from].position, &connection.intermediate_points, nodes[to].position)
                });
            links[from].push(WaterLink {
                target: to,
                distance,
                intermediate_points: connection.intermediate_points.clone(),
            });
        }
    }

    let present = &present;
    let reverse: Vec<(usize, WaterLink)> = links
        .iter()
        .enumerate()
        .flat_map(|(from, outgoing)| {
            outgoing
                .iter()
                .filter(move |link| !present.contains(&(link.target, from)))
                .map(move |link| {
                    let mut intermediate_points = link.intermediate_points.clone();
                    intermediate_points.reverse();
                    (
                        link.target,
                        WaterLink {
                            target: from,
                            distance: link.distance,
                            intermediate_points,
                        },
                    )
                })
        })
        .collect();
    for (from, link) in reverse {
        links[from].push(link);
    }

    if dangling > 0 {
        warn!("Dropped {dangling} water connections to unknown points");
    }

    let network = WaterNetwork::from_parts(nodes, links, false);
    info!(
        "Water network loaded: {} points, {} links",
        network.len(),
        network.link_count()
    );
    network
}

/// Pairwise-connects positions closer than [`SYNTHETIC_LINK_M`]
pub fn synthesize_water_network(positions: &[LatLng]) -> WaterNetwork {
    let mut unique: Vec<LatLng> = Vec::with_capacity(positions.len());
    for position in positions {
        if !unique.iter().any(|p| p.approx_eq(*position)) {
            unique.push(*position);
        }
    }

    let nodes: Vec<WaterNode> = unique
        .iter()
        .enumerate()
        .map(|(idx, position)| WaterNode {
            id: format!("synthetic:{idx}"),
            position: *position,
        })
        .collect();

    let mut links: Vec<Vec<WaterLink>> = vec![Vec::new(); nodes.len()];
    for a in 0..nodes.len() {
        for b in a + 1..nodes.len() {
            let distance = nodes[a].position.distance_to(nodes[b].position);
            if distance < SYNTHETIC_LINK_M {
                for (from, to) in [(a, b), (b, a)] {
                    links[from].push(WaterLink {
                        target: to,
                        distance,
                        intermediate_points: Vec::new(),
                    });
                }
            }
        }
    }

    let network = WaterNetwork::from_parts(nodes, links, true);
    info!(
        "Synthetic water network: {} points, {} links",
        network.len(),
        network.link_count()
    );
    network
}

impl WaterNetwork {
    pub fn from_raw(raw: &RawWaterGraph) -> Self {
        load_water_network(raw)
    }

    pub fn synthesize(positions: &[LatLng]) -> Self {
        synthesize_water_network(positions)
    }
}

fn path_length(from: LatLng, intermediate: &[LatLng], to: LatLng) -> f64 {
    let mut points = Vec::with_capacity(intermediate.len() + 2);
    points.push(from);
    points.extend_from_slice(intermediate);
    points.push(to);
    polyline_length(&points)
}
