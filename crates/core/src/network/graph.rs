//! Weighted directed transition graph built from a note sequence.
//!
//! Nodes are distinct notes; an edge (a, b) records that `a` was
//! immediately followed by `b`, weighted by how often that happened.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// A note sequence collapsed into a weighted directed graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionGraph {
    /// node -> (successor -> weight)
    successors: BTreeMap<i32, BTreeMap<i32, u32>>,
    /// node -> predecessors, kept for in-degree lookups
    predecessors: BTreeMap<i32, BTreeSet<i32>>,
    sequence_length: usize,
}

impl TransitionGraph {
    /// Build the transition graph of `sequence`. Never fails.
    pub fn from_sequence(sequence: &[i32]) -> Self {
        let mut graph = TransitionGraph {
            sequence_length: sequence.len(),
            ..Default::default()
        };

        // A lone note still becomes a node.
        if let [only] = sequence {
            graph.add_node(*only);
        }

        for pair in sequence.windows(2) {
            graph.add_transition(pair[0], pair[1]);
        }
        graph
    }

    pub(crate) fn add_node(&mut self, note: i32) {
        self.successors.entry(note).or_default();
        self.predecessors.entry(note).or_default();
    }

    pub(crate) fn add_transition(&mut self, from: i32, to: i32) {
        self.add_node(from);
        self.add_node(to);
        *self.successors.entry(from).or_default().entry(to).or_insert(0) += 1;
        self.predecessors.entry(to).or_default().insert(from);
    }

    /// Length of the sequence this graph was built from.
    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn num_nodes(&self) -> usize {
        self.successors.len()
    }

    /// Number of distinct directed pairs, self-loops included.
    pub fn num_edges(&self) -> usize {
        self.successors.values().map(|out| out.len()).sum()
    }

    pub fn contains_node(&self, note: i32) -> bool {
        self.successors.contains_key(&note)
    }

    /// Nodes in ascending note order.
    pub fn nodes(&self) -> impl Iterator<Item = i32> + '_ {
        self.successors.keys().copied()
    }

    /// All edges as `(from, to, weight)`, ordered by `from` then `to`.
    pub fn edges(&self) -> impl Iterator<Item = (i32, i32, u32)> + '_ {
        self.successors
            .iter()
            .flat_map(|(&from, out)| out.iter().map(move |(&to, &w)| (from, to, w)))
    }

    /// Weight of edge `from -> to`, or 0 if the transition never occurs.
    pub fn weight(&self, from: i32, to: i32) -> u32 {
        self.successors
            .get(&from)
            .and_then(|out| out.get(&to))
            .copied()
            .unwrap_or(0)
    }

    pub fn out_degree(&self, note: i32) -> usize {
        self.successors.get(&note).map_or(0, |out| out.len())
    }

    pub fn in_degree(&self, note: i32) -> usize {
        self.predecessors.get(&note).map_or(0, |preds| preds.len())
    }

    /// In-degree plus out-degree. A self-loop counts twice.
    pub fn degree(&self, note: i32) -> usize {
        self.in_degree(note) + self.out_degree(note)
    }

    /// Drop edge direction and merge parallel/opposite edges.
    ///
    /// Self-loops survive the projection; metrics that care about them
    /// filter them out explicitly.
    pub fn undirected_projection(&self) -> UndirectedGraph {
        let mut adjacency: BTreeMap<i32, BTreeSet<i32>> =
            self.nodes().map(|n| (n, BTreeSet::new())).collect();
        for (from, to, _) in self.edges() {
            adjacency.entry(from).or_default().insert(to);
            adjacency.entry(to).or_default().insert(from);
        }
        UndirectedGraph { adjacency }
    }
}

/// Build the transition graph of `sequence`.
pub fn build_graph(sequence: &[i32]) -> TransitionGraph {
    TransitionGraph::from_sequence(sequence)
}

/// Simple undirected graph: the direction-free view of a [`TransitionGraph`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UndirectedGraph {
    adjacency: BTreeMap<i32, BTreeSet<i32>>,
}

impl UndirectedGraph {
    pub fn num_nodes(&self) -> usize {
        self.adjacency.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = i32> + '_ {
        self.adjacency.keys().copied()
    }

    /// Neighbors of `note`, excluding `note` itself.
    pub fn neighbors(&self, note: i32) -> impl Iterator<Item = i32> + '_ {
        self.adjacency
            .get(&note)
            .into_iter()
            .flat_map(|set| set.iter().copied())
            .filter(move |&n| n != note)
    }

    pub fn has_edge(&self, a: i32, b: i32) -> bool {
        self.adjacency.get(&a).is_some_and(|set| set.contains(&b))
    }

    /// Connected components via BFS, each sorted ascending, in order of
    /// their smallest node.
    pub fn connected_components(&self) -> Vec<Vec<i32>> {
        let mut seen = BTreeSet::new();
        let mut components = Vec::new();

        for start in self.nodes() {
            if !seen.insert(start) {
                continue;
            }
            let mut component = vec![start];
            let mut queue = VecDeque::from([start]);
            while let Some(node) = queue.pop_front() {
                for next in self.neighbors(node) {
                    if seen.insert(next) {
                        component.push(next);
                        queue.push_back(next);
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }
        components
    }

    /// Hop distances from `source` to every reachable node (BFS).
    pub fn shortest_path_lengths_from(&self, source: i32) -> BTreeMap<i32, usize> {
        let mut dist = BTreeMap::new();
        if !self.adjacency.contains_key(&source) {
            return dist;
        }
        dist.insert(source, 0);
        let mut queue = VecDeque::from([source]);
        while let Some(node) = queue.pop_front() {
            let d = dist[&node];
            for next in self.neighbors(node) {
                if !dist.contains_key(&next) {
                    dist.insert(next, d + 1);
                    queue.push_back(next);
                }
            }
        }
        dist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sequence() {
        let g = build_graph(&[]);
        assert_eq!(g.num_nodes(), 0);
        assert_eq!(g.num_edges(), 0);
        assert_eq!(g.sequence_length(), 0);
    }

    #[test]
    fn test_single_note() {
        let g = build_graph(&[60]);
        assert_eq!(g.num_nodes(), 1);
        assert_eq!(g.num_edges(), 0);
        assert!(g.contains_node(60));
    }

    #[test]
    fn test_weights_follow_adjacency() {
        let g = build_graph(&[60, 62, 60, 62]);
        assert_eq!(g.num_nodes(), 2);
        assert_eq!(g.num_edges(), 2);
        assert_eq!(g.weight(60, 62), 2);
        assert_eq!(g.weight(62, 60), 1);
        assert_eq!(g.weight(62, 62), 0);
    }

    #[test]
    fn test_self_loop_degree() {
        let g = build_graph(&[60, 60, 62]);
        assert_eq!(g.weight(60, 60), 1);
        assert_eq!(g.in_degree(60), 1);
        assert_eq!(g.out_degree(60), 2);
        assert_eq!(g.degree(60), 3);
        assert_eq!(g.degree(62), 1);
    }

    #[test]
    fn test_edge_count_bounded_by_transitions() {
        let sequences: [&[i32]; 6] = [
            &[],
            &[60],
            &[60, 60, 60, 60],
            &[60, 62, 64, 65, 67, 69, 71, 72],
            &[60, 62, 60, 62, 60, 62],
            &[40, 45, 50, 55, 40, 45, 52, 57, 64, 40],
        ];
        for seq in sequences {
            let g = build_graph(seq);
            assert!(g.num_edges() <= seq.len().saturating_sub(1), "{:?}", seq);
        }
    }

    #[test]
    fn test_edges_sorted() {
        let g = build_graph(&[64, 60, 62, 60]);
        let edges: Vec<_> = g.edges().collect();
        assert_eq!(edges, vec![(60, 62, 1), (62, 60, 1), (64, 60, 1)]);
    }

    #[test]
    fn test_undirected_projection_merges_opposite_edges() {
        let u = build_graph(&[60, 62, 60, 64]).undirected_projection();
        assert_eq!(u.num_nodes(), 3);
        assert!(u.has_edge(60, 62));
        assert!(u.has_edge(62, 60));
        assert!(u.has_edge(64, 60));
        assert!(!u.has_edge(62, 64));
        assert_eq!(u.neighbors(60).collect::<Vec<_>>(), vec![62, 64]);
    }

    #[test]
    fn test_neighbors_skip_self_loop() {
        let u = build_graph(&[60, 60, 62]).undirected_projection();
        assert_eq!(u.neighbors(60).collect::<Vec<_>>(), vec![62]);
    }

    #[test]
    fn test_connected_components() {
        // Two separate transitions never linked to each other.
        let mut g = build_graph(&[60, 62]);
        let other = build_graph(&[70, 72, 74]);
        for (a, b, _) in other.edges() {
            g.add_transition(a, b);
        }
        g.add_node(90);
        let comps = g.undirected_projection().connected_components();
        assert_eq!(comps, vec![vec![60, 62], vec![70, 72, 74], vec![90]]);
    }

    #[test]
    fn test_shortest_paths() {
        let u = build_graph(&[60, 62, 64, 65]).undirected_projection();
        let dist = u.shortest_path_lengths_from(60);
        assert_eq!(dist[&60], 0);
        assert_eq!(dist[&62], 1);
        assert_eq!(dist[&64], 2);
        assert_eq!(dist[&65], 3);
        assert!(u.shortest_path_lengths_from(99).is_empty());
    }
}
