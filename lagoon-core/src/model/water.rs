//! Navigable water network

use hashbrown::HashMap;
use rstar::{RTree, primitives::GeomWithData};
use serde::{Deserialize, Serialize};

use super::LatLng;

/// Precomputed water graph as served by the data provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWaterGraph {
    #[serde(default)]
    pub water_points: Vec<RawWaterPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWaterPoint {
    pub id: String,
    pub position: LatLng,
    #[serde(default)]
    pub connections: Vec<RawWaterConnection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWaterConnection {
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default)]
    pub intermediate_points: Vec<LatLng>,
}

#[derive(Debug, Clone)]
pub struct WaterNode {
    pub id: String,
    pub position: LatLng,
}

/// Directed link between two water nodes
#[derive(Debug, Clone)]
pub struct WaterLink {
    pub target: usize,
    /// Length in meters along the intermediate points
    pub distance: f64,
    /// Waypoints strictly between source and target
    pub intermediate_points: Vec<LatLng>,
}

/// Flat water graph with a spatial index for snapping
#[derive(Debug, Clone)]
pub struct WaterNetwork {
    nodes: Vec<WaterNode>,
    links: Vec<Vec<WaterLink>>,
    ids: HashMap<String, usize>,
    rtree: RTree<GeomWithData<[f64; 2], usize>>,
    synthetic: bool,
}

impl WaterNetwork {
    pub(crate) fn from_parts(
        nodes: Vec<WaterNode>,
        links: Vec<Vec<WaterLink>>,
        synthetic: bool,
    ) -> Self {
        debug_assert_eq!(nodes.len(), links.len());
        let ids = nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.id.clone(), idx))
            .collect();
        let rtree = RTree::bulk_load(
            nodes
                .iter()
                .enumerate()
                .map(|(idx, node)| GeomWithData::new(node.position.as_array(), idx))
                .collect(),
        );

        Self {
            nodes,
            links,
            ids,
            rtree,
            synthetic,
        }
    }

    pub fn empty() -> Self {
        Self::from_parts(Vec::new(), Vec::new(), false)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `true` when the network was derived from canal points instead of a precomputed graph
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn node(&self, idx: usize) -> &WaterNode {
        &self.nodes[idx]
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.ids.get(id).copied()
    }

    pub fn links(&self, idx: usize) -> &[WaterLink] {
        &self.links[idx]
    }

    pub fn link_count(&self) -> usize {
        self.links.iter().map(Vec::len).sum()
    }

    /// Cheapest direct link from `from` to `to`
    pub fn link(&self, from: usize, to: usize) -> Option<&WaterLink> {
        self.links[from]
            .iter()
            .filter(|link| link.target == to)
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Nearest water node and its distance in meters
    pub fn nearest_node(&self, position: LatLng) -> Option<(usize, f64)> {
        self.rtree
            .nearest_neighbor(&position.as_array())
            .map(|entry| (entry.data, self.nodes[entry.data].position.distance_to(position)))
    }
}
