use std::{cmp::Ordering, collections::BinaryHeap};

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;
use petgraph::graph::NodeIndex;

use crate::model::{LandGraph, PointKind, WaterNetwork};

/// Graph the shortest-path solver can run on
pub trait SearchGraph {
    type Node: Copy + Eq + std::hash::Hash;

    /// Upper bound (exclusive) on [`SearchGraph::index`]
    fn node_bound(&self) -> usize;

    fn index(&self, node: Self::Node) -> usize;

    fn kind(&self, node: Self::Node) -> PointKind;

    /// Adjacent nodes with the connecting edge weight
    fn neighbours(&self, node: Self::Node) -> impl Iterator<Item = (Self::Node, f64)> + '_;
}

impl SearchGraph for LandGraph {
    type Node = NodeIndex;

    fn node_bound(&self) -> usize {
        self.graph.node_count()
    }

    fn index(&self, node: NodeIndex) -> usize {
        node.index()
    }

    fn kind(&self, node: NodeIndex) -> PointKind {
        self.node(node).kind
    }

    fn neighbours(&self, node: NodeIndex) -> impl Iterator<Item = (NodeIndex, f64)> + '_ {
        LandGraph::neighbours(self, node)
    }
}

impl SearchGraph for WaterNetwork {
    type Node = usize;

    fn node_bound(&self) -> usize {
        self.len()
    }

    fn index(&self, node: usize) -> usize {
        node
    }

    fn kind(&self, _node: usize) -> PointKind {
        PointKind::Water
    }

    fn neighbours(&self, node: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.links(node)
            .iter()
            .map(|link| (link.target, link.distance))
    }
}

/// Per edge-type cost multipliers. They bias route selection only; reported
/// distances are always measured on the resulting geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightProfile {
    multipliers: HashMap<(PointKind, PointKind), f64>,
}

impl Default for WeightProfile {
    fn default() -> Self {
        Self::neutral()
            .with_multiplier(PointKind::Bridge, PointKind::Bridge, 0.7)
            .with_multiplier(PointKind::Bridge, PointKind::Center, 0.7)
            .with_multiplier(PointKind::Canal, PointKind::Canal, 0.5)
    }
}

impl WeightProfile {
    /// No multipliers at all
    pub fn neutral() -> Self {
        Self {
            multipliers: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_multiplier(mut self, a: PointKind, b: PointKind, multiplier: f64) -> Self {
        self.multipliers.insert(Self::key(a, b), multiplier);
        self
    }

    /// Multiplier for an edge between `a` and `b`, order-insensitive
    pub fn multiplier(&self, a: PointKind, b: PointKind) -> f64 {
        self.multipliers
            .get(&Self::key(a, b))
            .copied()
            .unwrap_or(1.0)
    }

    fn key(a: PointKind, b: PointKind) -> (PointKind, PointKind) {
        if a <= b { (a, b) } else { (b, a) }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolvedPath<N> {
    pub nodes: Vec<N>,
    /// Cost under the weight profile, including access and egress costs
    pub cost: f64,
}

#[derive(Copy, Clone)]
struct State<N> {
    cost: f64,
    node: N,
}

impl<N> PartialEq for State<N> {
    fn eq(&self, other: &Self) -> bool {
        self.cost.total_cmp(&other.cost) == Ordering::Equal
    }
}

impl<N> Eq for State<N> {}

// Implement Ord for State to use in BinaryHeap
impl<N> Ord for State<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap by cost (reversed from standard Rust BinaryHeap)
        other.cost.total_cmp(&self.cost)
    }
}

impl<N> PartialOrd for State<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest path between two nodes
pub fn shortest_path<G: SearchGraph>(
    graph: &G,
    start: G::Node,
    end: G::Node,
    profile: &WeightProfile,
) -> Option<SolvedPath<G::Node>> {
    shortest_path_between_sets(graph, &[(start, 0.0)], &[(end, 0.0)], profile)
}

/// Shortest path from any source to any target. Each source carries the cost
/// of reaching it and each target the cost of leaving it.
pub fn shortest_path_between_sets<G: SearchGraph>(
    graph: &G,
    sources: &[(G::Node, f64)],
    targets: &[(G::Node, f64)],
    profile: &WeightProfile,
) -> Option<SolvedPath<G::Node>> {
    if sources.is_empty() || targets.is_empty() {
        return None;
    }

    let egress: HashMap<G::Node, f64> = targets.iter().fold(HashMap::new(), |mut acc, &(node, cost)| {
        let entry = acc.entry(node).or_insert(cost);
        *entry = entry.min(cost);
        acc
    });

    let estimated_nodes = graph.node_bound().min(1000);
    let mut distances: HashMap<G::Node, f64> = HashMap::with_capacity(estimated_nodes);
    let mut predecessors: HashMap<G::Node, G::Node> = HashMap::with_capacity(estimated_nodes);
    let mut settled = FixedBitSet::with_capacity(graph.node_bound());
    let mut heap = BinaryHeap::with_capacity(estimated_nodes / 4);

    for &(node, cost) in sources {
        let better = distances.get(&node).is_none_or(|&best| cost < best);
        if better {
            distances.insert(node, cost);
            heap.push(State { cost, node });
        }
    }

    let mut best: Option<(G::Node, f64)> = None;

    while let Some(State { cost, node }) = heap.pop() {
        // Every remaining candidate is at least this expensive
        if best.is_some_and(|(_, total)| cost >= total) {
            break;
        }

        let idx = graph.index(node);
        if settled.contains(idx) {
            continue;
        }
        settled.insert(idx);

        if let Some(&exit) = egress.get(&node) {
            let total = cost + exit;
            if best.is_none_or(|(_, current)| total < current) {
                best = Some((node, total));
            }
        }

        let kind = graph.kind(node);
        for (next, weight) in graph.neighbours(node) {
            if settled.contains(graph.index(next)) {
                continue;
            }
            let next_cost = cost + weight * profile.multiplier(kind, graph.kind(next));

            // Add or update distance if better using Entry API
            match distances.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    predecessors.insert(next, node);
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        predecessors.insert(next, node);
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                    }
                }
            }
        }
    }

    let (end, cost) = best?;
    let mut nodes = vec![end];
    let mut current = end;
    while let Some(&previous) = predecessors.get(&current) {
        nodes.push(previous);
        current = previous;
    }
    nodes.reverse();

    Some(SolvedPath { nodes, cost })
}
