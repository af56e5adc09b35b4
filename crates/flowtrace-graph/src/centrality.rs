//! Degree and sampled betweenness centrality.

use std::collections::VecDeque;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::debug;

use crate::graph::{NodeId, TransactionGraph};

/// Centrality values per vertex, indexed by [`NodeId`].
#[derive(Debug, Clone, Default)]
pub struct CentralityMaps {
    /// `(in_degree + out_degree) / (|V| - 1)`, 0 for trivial graphs.
    pub degree: Vec<f64>,
    /// Sampled, normalised betweenness for a directed graph.
    pub betweenness: Vec<f64>,
}

/// Computes degree and approximate betweenness centrality.
///
/// Betweenness uses Brandes dependency accumulation over unweighted
/// shortest paths from at most `samples` source vertices. Sources are
/// drawn with a seeded RNG and partial sums are reduced in source order,
/// so results are identical across reruns and thread counts.
#[derive(Debug, Clone)]
pub struct CentralityComputer {
    samples: usize,
    seed: u64,
}

impl CentralityComputer {
    /// Creates a computer with the given sample cap and sampling seed.
    pub fn new(samples: usize, seed: u64) -> Self {
        Self { samples, seed }
    }

    /// Computes both centrality maps for the graph.
    pub fn compute(&self, graph: &TransactionGraph) -> CentralityMaps {
        CentralityMaps {
            degree: self.degree_centrality(graph),
            betweenness: self.betweenness_centrality(graph),
        }
    }

    fn degree_centrality(&self, graph: &TransactionGraph) -> Vec<f64> {
        let n = graph.node_count();
        if n <= 1 {
            return vec![0.0; n];
        }

        let scale = 1.0 / (n - 1) as f64;
        graph
            .nodes()
            .map(|v| graph.degree(v) as f64 * scale)
            .collect()
    }

    fn betweenness_centrality(&self, graph: &TransactionGraph) -> Vec<f64> {
        let n = graph.node_count();
        if n <= 2 {
            // No path has an interior vertex.
            return vec![0.0; n];
        }

        let k = self.samples.min(n).max(1);
        let sources: Vec<NodeId> = if k == n {
            (0..n).collect()
        } else {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
            let mut sampled = rand::seq::index::sample(&mut rng, n, k).into_vec();
            sampled.sort_unstable();
            sampled
        };
        debug!(nodes = n, sources = sources.len(), "betweenness sampling");

        let partials: Vec<Vec<f64>> = sources
            .par_iter()
            .map(|&source| Self::dependencies(graph, source))
            .collect();

        let mut betweenness = vec![0.0; n];
        for partial in &partials {
            for (total, delta) in betweenness.iter_mut().zip(partial) {
                *total += delta;
            }
        }

        // Directed normalisation, rescaled for the sample size.
        let scale = n as f64 / (k as f64 * (n - 1) as f64 * (n - 2) as f64);
        for value in &mut betweenness {
            *value *= scale;
        }
        betweenness
    }

    /// Brandes single-source dependency accumulation over BFS layers.
    fn dependencies(graph: &TransactionGraph, source: NodeId) -> Vec<f64> {
        let n = graph.node_count();
        let mut visit_order: Vec<NodeId> = Vec::with_capacity(n);
        let mut predecessors: Vec<Vec<NodeId>> = vec![Vec::new(); n];
        let mut path_counts = vec![0.0f64; n];
        let mut distance = vec![-1i64; n];
        let mut queue = VecDeque::new();

        path_counts[source] = 1.0;
        distance[source] = 0;
        queue.push_back(source);

        while let Some(v) = queue.pop_front() {
            visit_order.push(v);
            for &w in graph.out_neighbors(v) {
                if distance[w] < 0 {
                    distance[w] = distance[v] + 1;
                    queue.push_back(w);
                }
                if distance[w] == distance[v] + 1 {
                    path_counts[w] += path_counts[v];
                    predecessors[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0f64; n];
        while let Some(w) = visit_order.pop() {
            for &v in &predecessors[w] {
                delta[v] += path_counts[v] / path_counts[w] * (1.0 + delta[w]);
            }
        }
        delta[source] = 0.0;
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crate::graph::EdgeAttrs;

    fn attrs(hour: u32) -> EdgeAttrs {
        EdgeAttrs {
            amount: 100.0,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap(),
        }
    }

    fn computer() -> CentralityComputer {
        CentralityComputer::new(50, 7)
    }

    #[test]
    fn test_trivial_graphs_are_all_zero() {
        let mut graph = TransactionGraph::new();
        graph.intern("A");
        let maps = computer().compute(&graph);
        assert_eq!(maps.degree, vec![0.0]);
        assert_eq!(maps.betweenness, vec![0.0]);

        graph.upsert_edge("A", "B", attrs(1));
        let maps = computer().compute(&graph);
        assert_eq!(maps.betweenness, vec![0.0, 0.0]);
    }

    #[test]
    fn test_degree_centrality_path() {
        // A -> B -> C: B touches both edges.
        let mut graph = TransactionGraph::new();
        graph.upsert_edge("A", "B", attrs(1));
        graph.upsert_edge("B", "C", attrs(2));

        let maps = computer().compute(&graph);
        let b = graph.node_id("B").unwrap();
        assert_eq!(maps.degree[b], 1.0);
        let a = graph.node_id("A").unwrap();
        assert_eq!(maps.degree[a], 0.5);
    }

    #[test]
    fn test_betweenness_path_midpoint() {
        // A -> B -> C: only the A->C path has an interior vertex, so
        // B = 1 / ((n-1)(n-2)) = 0.5 and the endpoints are 0.
        let mut graph = TransactionGraph::new();
        graph.upsert_edge("A", "B", attrs(1));
        graph.upsert_edge("B", "C", attrs(2));

        let maps = computer().compute(&graph);
        let a = graph.node_id("A").unwrap();
        let b = graph.node_id("B").unwrap();
        let c = graph.node_id("C").unwrap();
        assert!((maps.betweenness[b] - 0.5).abs() < 1e-12);
        assert_eq!(maps.betweenness[a], 0.0);
        assert_eq!(maps.betweenness[c], 0.0);
    }

    #[test]
    fn test_betweenness_directed_cycle() {
        // In a 3-cycle every vertex bridges one pair: 1 / (2 * 1) = 0.5.
        let mut graph = TransactionGraph::new();
        graph.upsert_edge("A", "B", attrs(1));
        graph.upsert_edge("B", "C", attrs(2));
        graph.upsert_edge("C", "A", attrs(3));

        let maps = computer().compute(&graph);
        for v in graph.nodes() {
            assert!((maps.betweenness[v] - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_split_shortest_paths() {
        // Two equal-length A->D paths; each midpoint carries half.
        let mut graph = TransactionGraph::new();
        graph.upsert_edge("A", "B", attrs(1));
        graph.upsert_edge("A", "C", attrs(2));
        graph.upsert_edge("B", "D", attrs(3));
        graph.upsert_edge("C", "D", attrs(4));

        let maps = computer().compute(&graph);
        let b = graph.node_id("B").unwrap();
        let c = graph.node_id("C").unwrap();
        // delta = 0.5, scale = 1 / ((4-1)(4-2)) = 1/6.
        assert!((maps.betweenness[b] - 0.5 / 6.0).abs() < 1e-12);
        assert_eq!(maps.betweenness[b], maps.betweenness[c]);
    }

    #[test]
    fn test_sampled_betweenness_is_deterministic() {
        let mut graph = TransactionGraph::new();
        for i in 0..80 {
            let from = format!("N{:03}", i);
            let to = format!("N{:03}", (i * 7 + 3) % 80);
            graph.upsert_edge(&from, &to, attrs(1 + (i % 20) as u32 / 2));
        }
        assert!(graph.node_count() > 50, "must exercise the sampling path");

        let first = CentralityComputer::new(50, 99).compute(&graph);
        let second = CentralityComputer::new(50, 99).compute(&graph);
        assert_eq!(first.betweenness, second.betweenness);
    }
}
