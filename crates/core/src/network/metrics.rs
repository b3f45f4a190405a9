//! Structural statistics of a transition graph.
//!
//! Every function here is total: empty graphs, single nodes and fully
//! disconnected graphs map to zeros so batch averaging is never
//! interrupted by one pathological sequence.

use serde::{Deserialize, Serialize};

use super::graph::{TransitionGraph, UndirectedGraph};

/// Metric names in reporting order.
pub const METRIC_NAMES: [&str; 7] = [
    "sequence_length",
    "num_nodes",
    "num_edges",
    "avg_degree",
    "density",
    "clustering_coefficient",
    "avg_path_length",
];

/// Network metrics of one note sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub sequence_length: usize,
    pub num_nodes: usize,
    pub num_edges: usize,
    /// Mean of in-degree + out-degree over nodes
    pub avg_degree: f64,
    /// Directed density, num_edges / (n * (n - 1))
    pub density: f64,
    /// Average clustering on the undirected projection
    pub clustering_coefficient: f64,
    /// Component-size-weighted average shortest path length
    pub avg_path_length: f64,
}

impl NetworkMetrics {
    /// `(name, value)` pairs in [`METRIC_NAMES`] order.
    pub fn fields(&self) -> [(&'static str, f64); 7] {
        [
            (METRIC_NAMES[0], self.sequence_length as f64),
            (METRIC_NAMES[1], self.num_nodes as f64),
            (METRIC_NAMES[2], self.num_edges as f64),
            (METRIC_NAMES[3], self.avg_degree),
            (METRIC_NAMES[4], self.density),
            (METRIC_NAMES[5], self.clustering_coefficient),
            (METRIC_NAMES[6], self.avg_path_length),
        ]
    }

    /// Look up a metric by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }
}

/// Compute all metrics for a graph.
pub fn compute_metrics(graph: &TransitionGraph) -> NetworkMetrics {
    let num_nodes = graph.num_nodes();
    let num_edges = graph.num_edges();
    if num_nodes == 0 {
        return NetworkMetrics {
            sequence_length: graph.sequence_length(),
            ..Default::default()
        };
    }

    let undirected = graph.undirected_projection();
    NetworkMetrics {
        sequence_length: graph.sequence_length(),
        num_nodes,
        num_edges,
        avg_degree: average_degree(graph),
        density: density(num_nodes, num_edges),
        clustering_coefficient: average_clustering(&undirected),
        avg_path_length: weighted_average_path_length(&undirected),
    }
}

/// Build the graph of `sequence` and compute its metrics.
pub fn analyze_sequence(sequence: &[i32]) -> NetworkMetrics {
    compute_metrics(&TransitionGraph::from_sequence(sequence))
}

fn average_degree(graph: &TransitionGraph) -> f64 {
    let n = graph.num_nodes();
    if n == 0 {
        return 0.0;
    }
    let total: usize = graph.nodes().map(|v| graph.degree(v)).sum();
    total as f64 / n as f64
}

/// Self-loops count toward `num_edges` but the denominator only counts
/// ordered pairs of distinct nodes.
pub fn density(num_nodes: usize, num_edges: usize) -> f64 {
    if num_nodes < 2 {
        return 0.0;
    }
    num_edges as f64 / (num_nodes * (num_nodes - 1)) as f64
}

/// Local clustering of one node, ignoring self-loops.
pub fn local_clustering(graph: &UndirectedGraph, node: i32) -> f64 {
    let neighbors: Vec<i32> = graph.neighbors(node).collect();
    let d = neighbors.len();
    if d < 2 {
        return 0.0;
    }
    let mut links = 0usize;
    for (i, &a) in neighbors.iter().enumerate() {
        for &b in &neighbors[i + 1..] {
            if graph.has_edge(a, b) {
                links += 1;
            }
        }
    }
    2.0 * links as f64 / (d * (d - 1)) as f64
}

/// Mean local clustering over all nodes.
pub fn average_clustering(graph: &UndirectedGraph) -> f64 {
    let n = graph.num_nodes();
    if n == 0 {
        return 0.0;
    }
    let total: f64 = graph.nodes().map(|v| local_clustering(graph, v)).sum();
    total / n as f64
}

/// Average hop distance over ordered pairs of distinct nodes in one
/// connected component. Zero for components with fewer than two nodes.
pub fn component_average_path_length(graph: &UndirectedGraph, component: &[i32]) -> f64 {
    let n = component.len();
    if n < 2 {
        return 0.0;
    }
    let total: usize = component
        .iter()
        .map(|&source| graph.shortest_path_lengths_from(source).values().sum::<usize>())
        .sum();
    total as f64 / (n * (n - 1)) as f64
}

/// Per-component average path length, weighted by component size.
///
/// Singleton components are left out of both sums; a graph without any
/// component of two or more nodes scores 0.
pub fn weighted_average_path_length(graph: &UndirectedGraph) -> f64 {
    let mut weighted_sum = 0.0;
    let mut total_nodes = 0usize;

    for component in graph.connected_components() {
        if component.len() < 2 {
            continue;
        }
        weighted_sum += component_average_path_length(graph, &component) * component.len() as f64;
        total_nodes += component.len();
    }

    if total_nodes == 0 {
        0.0
    } else {
        weighted_sum / total_nodes as f64
    }
}
