//! Note sequences as directed transition networks.

pub mod graph;
pub mod metrics;

pub use graph::{build_graph, TransitionGraph, UndirectedGraph};
pub use metrics::{analyze_sequence, compute_metrics, NetworkMetrics, METRIC_NAMES};
