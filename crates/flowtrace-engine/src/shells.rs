//! Layered shell-chain detection.
//!
//! Shell accounts are low-activity pass-throughs: a little in, a little
//! out, nothing else. Chains of connected shells are the layering stage of
//! a laundering path, so any weakly connected component of two or more
//! shells is flagged as one ring.

use std::collections::HashSet;

use tracing::debug;

use flowtrace_graph::{NodeId, TransactionGraph};

/// Fixed ring risk for a layered shell network.
pub const SHELL_RISK_SCORE: f64 = 85.0;

/// Total-degree band for a potential shell.
const MIN_SHELL_DEGREE: usize = 2;
const MAX_SHELL_DEGREE: usize = 3;

/// Outcome of the shell stage.
#[derive(Debug, Default)]
pub struct ShellAnalysis {
    /// Components of two or more connected shells, ordered by their
    /// smallest member account id; members ascending by account id.
    pub components: Vec<Vec<NodeId>>,
    /// Every vertex of every emitted component.
    pub shell_nodes: HashSet<NodeId>,
}

impl ShellAnalysis {
    /// Whether a vertex sits in an emitted shell chain.
    pub fn contains(&self, node: NodeId) -> bool {
        self.shell_nodes.contains(&node)
    }
}

/// Finds weakly connected components of pass-through shell vertices.
#[derive(Debug, Clone, Default)]
pub struct ShellDetector;

impl ShellDetector {
    /// Creates a detector.
    pub fn new() -> Self {
        Self
    }

    /// Runs shell identification and component grouping.
    pub fn detect(&self, graph: &TransactionGraph) -> ShellAnalysis {
        let shells: HashSet<NodeId> = graph
            .nodes()
            .filter(|&v| Self::is_potential_shell(graph, v))
            .collect();

        let mut analysis = ShellAnalysis::default();
        if shells.is_empty() {
            return analysis;
        }

        // Weakly connected components of the induced shell subgraph.
        let mut visited: HashSet<NodeId> = HashSet::new();
        for &start in &shells {
            if visited.contains(&start) {
                continue;
            }

            let mut component = Vec::new();
            let mut frontier = vec![start];
            visited.insert(start);
            while let Some(v) = frontier.pop() {
                component.push(v);
                let neighbors = graph
                    .out_neighbors(v)
                    .iter()
                    .chain(graph.in_neighbors(v).iter());
                for &w in neighbors {
                    if shells.contains(&w) && visited.insert(w) {
                        frontier.push(w);
                    }
                }
            }

            if component.len() >= 2 {
                component.sort_by(|&a, &b| graph.account(a).cmp(graph.account(b)));
                analysis.components.push(component);
            }
        }

        // Discovery above depends on set iteration; fix the order by each
        // component's representative (smallest member id).
        analysis
            .components
            .sort_by(|a, b| graph.account(a[0]).cmp(graph.account(b[0])));

        for component in &analysis.components {
            analysis.shell_nodes.extend(component.iter().copied());
        }

        debug!(
            shells = shells.len(),
            chains = analysis.components.len(),
            "shell scan complete"
        );
        analysis
    }

    /// A shell moves money through without accumulating activity.
    fn is_potential_shell(graph: &TransactionGraph, v: NodeId) -> bool {
        let in_degree = graph.in_degree(v);
        let out_degree = graph.out_degree(v);
        in_degree >= 1
            && out_degree >= 1
            && (MIN_SHELL_DEGREE..=MAX_SHELL_DEGREE).contains(&(in_degree + out_degree))
    }
}
