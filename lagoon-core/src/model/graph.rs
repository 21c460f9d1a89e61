//! Weighted land graph produced by the builder

use hashbrown::HashMap;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rstar::{RTree, primitives::GeomWithData};

use super::{LatLng, PathfindingMode, Point, PointKind};

/// Land graph node
#[derive(Debug, Clone)]
pub struct GraphNode {
    /// Stable identifier, e.g. `center:polygon-1` or `bridge:bridge-12`
    pub id: String,
    pub position: LatLng,
    pub kind: PointKind,
    pub polygon_id: Option<String>,
}

impl GraphNode {
    pub fn new(
        id: impl Into<String>,
        position: LatLng,
        kind: PointKind,
        polygon_id: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            position,
            kind,
            polygon_id,
        }
    }

    pub fn to_point(&self) -> Point {
        let point = Point::from(self.position).with_kind(self.kind);
        match &self.polygon_id {
            Some(polygon_id) => point.with_polygon(polygon_id.clone()),
            None => point,
        }
    }
}

/// Land graph edge
#[derive(Debug, Clone, Copy)]
pub struct GraphEdge {
    /// Edge weight in meters, already scaled for bridges and canals
    pub weight: f64,
}

/// Undirected graph: every edge is traversable both ways with the same weight
#[derive(Debug, Clone)]
pub struct LandGraph {
    pub graph: UnGraph<GraphNode, GraphEdge>,
    ids: HashMap<String, NodeIndex>,
    rtree: RTree<GeomWithData<[f64; 2], NodeIndex>>,
    mode: PathfindingMode,
}

impl LandGraph {
    pub fn new(mode: PathfindingMode) -> Self {
        Self {
            graph: UnGraph::default(),
            ids: HashMap::new(),
            rtree: RTree::new(),
            mode,
        }
    }

    pub fn mode(&self) -> PathfindingMode {
        self.mode
    }

    /// Adds a node, or returns the existing one with the same id
    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&existing) = self.ids.get(&node.id) {
            return existing;
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.ids.insert(id, idx);
        idx
    }

    /// Connects two nodes in both directions. A repeated connection keeps the
    /// lower weight.
    pub fn connect(&mut self, a: NodeIndex, b: NodeIndex, weight: f64) -> Option<EdgeIndex> {
        if a == b || !weight.is_finite() || weight < 0.0 {
            return None;
        }
        match self.graph.find_edge(a, b) {
            Some(edge) => {
                let existing = &mut self.graph[edge];
                existing.weight = existing.weight.min(weight);
                Some(edge)
            }
            None => Some(self.graph.add_edge(a, b, GraphEdge { weight })),
        }
    }

    /// Rebuilds the spatial index, call after the last `add_node`
    pub fn finalize(&mut self) {
        self.rtree = RTree::bulk_load(
            self.graph
                .node_indices()
                .map(|idx| GeomWithData::new(self.graph[idx].position.as_array(), idx))
                .collect(),
        );
    }

    pub fn node(&self, idx: NodeIndex) -> &GraphNode {
        &self.graph[idx]
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.ids.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph.node_weights().map(|node| node.id.as_str())
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn edge_weight(&self, a: NodeIndex, b: NodeIndex) -> Option<f64> {
        self.graph
            .find_edge(a, b)
            .map(|edge| self.graph[edge].weight)
    }

    /// Adjacent nodes with the connecting edge weight
    pub fn neighbours(&self, node: NodeIndex) -> impl Iterator<Item = (NodeIndex, f64)> + '_ {
        self.graph.edges(node).map(move |edge| {
            let other = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            (other, edge.weight().weight)
        })
    }

    /// Up to `limit` nodes accepted by `filter`, nearest first, with their distance in meters
    pub fn nearest_nodes<F>(&self, position: LatLng, limit: usize, filter: F) -> Vec<(NodeIndex, f64)>
    where
        F: Fn(&GraphNode) -> bool,
    {
        if self.rtree.size() != self.graph.node_count() {
            let mut all: Vec<_> = self
                .graph
                .node_indices()
                .filter(|&idx| filter(&self.graph[idx]))
                .map(|idx| (idx, self.graph[idx].position.distance_to(position)))
                .collect();
            all.sort_by(|a, b| a.1.total_cmp(&b.1));
            all.truncate(limit);
            return all;
        }

        let mut found: Vec<_> = self
            .rtree
            .nearest_neighbor_iter(&position.as_array())
            .filter(|entry| filter(&self.graph[entry.data]))
            .take(limit)
            .map(|entry| (entry.data, self.graph[entry.data].position.distance_to(position)))
            .collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1));
        found
    }
}
