//! Bounded enumeration of simple transaction cycles.
//!
//! Cycles are enumerated with Johnson's algorithm, each cycle rooted at its
//! smallest vertex and roots visited in ascending order, so discovery order
//! is deterministic. Enumeration stops once the budget of examined cycles
//! is spent; cycles outside the retained length window still consume
//! budget.

use std::collections::HashMap;

use tracing::{debug, warn};

use flowtrace_core::{round2, DetectionConfig};
use flowtrace_graph::{NodeId, TransactionGraph};

/// Base risk for any retained cycle.
const CYCLE_RISK_BASE: f64 = 60.0;
/// Risk added per cycle hop.
const CYCLE_RISK_PER_HOP: f64 = 5.0;
/// Bonus when the amounts around the cycle are near-uniform.
const CONSISTENCY_BONUS: f64 = 20.0;
/// Variance-to-mean ratio below which amounts count as consistent.
const CONSISTENCY_RATIO: f64 = 0.2;

/// One retained cycle with its ring-candidate scoring.
#[derive(Debug, Clone)]
pub struct CycleRing {
    /// Cycle members in traversal order.
    pub members: Vec<NodeId>,
    /// Ring risk in [0, 100].
    pub risk_score: f64,
}

/// Outcome of the cycle stage.
#[derive(Debug, Default)]
pub struct CycleAnalysis {
    /// Ring candidates, one per retained cycle, in discovery order.
    pub rings: Vec<CycleRing>,
    /// Indices into `rings` per participating vertex, in append order.
    pub cycles_by_node: HashMap<NodeId, Vec<usize>>,
    /// Whether enumeration stopped at the budget.
    pub budget_exhausted: bool,
}

impl CycleAnalysis {
    /// Number of retained cycles a vertex participates in.
    pub fn cycle_count(&self, node: NodeId) -> usize {
        self.cycles_by_node.get(&node).map(Vec::len).unwrap_or(0)
    }

    /// Distinct lengths of the cycles a vertex participates in, ascending.
    pub fn cycle_lengths(&self, node: NodeId) -> Vec<usize> {
        let mut lengths: Vec<usize> = self
            .cycles_by_node
            .get(&node)
            .map(|indices| indices.iter().map(|&i| self.rings[i].members.len()).collect())
            .unwrap_or_default();
        lengths.sort_unstable();
        lengths.dedup();
        lengths
    }
}

/// Enumerates simple directed cycles and scores the retained ones.
#[derive(Debug, Clone)]
pub struct CycleDetector {
    budget: usize,
    min_len: usize,
    max_len: usize,
}

impl CycleDetector {
    /// Creates a detector from pipeline configuration.
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self {
            budget: config.cycle_budget,
            min_len: config.min_cycle_len,
            max_len: config.max_cycle_len,
        }
    }

    /// Runs enumeration and per-cycle scoring.
    pub fn detect(&self, graph: &TransactionGraph) -> CycleAnalysis {
        let mut enumerator = CycleEnumerator::new(graph, self.budget, self.min_len, self.max_len);
        enumerator.run();

        let mut analysis = CycleAnalysis {
            budget_exhausted: enumerator.exhausted,
            ..CycleAnalysis::default()
        };

        for (index, cycle) in enumerator.retained.into_iter().enumerate() {
            let risk_score = Self::cycle_risk(graph, &cycle);
            for &node in &cycle {
                analysis.cycles_by_node.entry(node).or_default().push(index);
            }
            analysis.rings.push(CycleRing {
                members: cycle,
                risk_score,
            });
        }

        if analysis.budget_exhausted {
            warn!(
                examined = enumerator.examined,
                retained = analysis.rings.len(),
                "cycle enumeration stopped at budget; results may be incomplete"
            );
        } else {
            debug!(
                examined = enumerator.examined,
                retained = analysis.rings.len(),
                "cycle enumeration complete"
            );
        }
        analysis
    }

    /// Risk of one cycle: length plus an amount-consistency bonus.
    fn cycle_risk(graph: &TransactionGraph, cycle: &[NodeId]) -> f64 {
        let k = cycle.len();
        let amounts: Vec<f64> = (0..k)
            .map(|j| {
                let u = cycle[j];
                let v = cycle[(j + 1) % k];
                graph.edge(u, v).map(|e| e.amount).unwrap_or(0.0)
            })
            .collect();

        let avg = amounts.iter().sum::<f64>() / k as f64;
        let variance = amounts.iter().map(|a| (a - avg).powi(2)).sum::<f64>() / k as f64;
        let bonus = if variance < avg * CONSISTENCY_RATIO {
            CONSISTENCY_BONUS
        } else {
            0.0
        };

        round2(CYCLE_RISK_BASE + CYCLE_RISK_PER_HOP * k as f64 + bonus).min(100.0)
    }
}

/// Johnson-style enumerator with a budget on examined cycles.
struct CycleEnumerator<'g> {
    graph: &'g TransactionGraph,
    /// Out-neighbours sorted ascending, fixed for the whole run.
    adjacency: Vec<Vec<NodeId>>,
    blocked: Vec<bool>,
    block_lists: Vec<Vec<NodeId>>,
    path: Vec<NodeId>,
    root: NodeId,
    budget: usize,
    min_len: usize,
    max_len: usize,
    examined: usize,
    retained: Vec<Vec<NodeId>>,
    exhausted: bool,
}

impl<'g> CycleEnumerator<'g> {
    fn new(graph: &'g TransactionGraph, budget: usize, min_len: usize, max_len: usize) -> Self {
        let adjacency = graph
            .nodes()
            .map(|v| {
                let mut neighbors = graph.out_neighbors(v).to_vec();
                neighbors.sort_unstable();
                neighbors
            })
            .collect();

        let n = graph.node_count();
        Self {
            graph,
            adjacency,
            blocked: vec![false; n],
            block_lists: vec![Vec::new(); n],
            path: Vec::new(),
            root: 0,
            budget,
            min_len,
            max_len,
            examined: 0,
            retained: Vec::new(),
            exhausted: false,
        }
    }

    fn run(&mut self) {
        if self.budget == 0 {
            self.exhausted = true;
            return;
        }
        for root in 0..self.graph.node_count() {
            if self.exhausted {
                break;
            }
            self.root = root;
            self.blocked.fill(false);
            for list in &mut self.block_lists {
                list.clear();
            }
            self.circuit(root);
        }
    }

    /// Explores simple paths from `v` back to the root. Returns whether a
    /// cycle was closed somewhere below `v`.
    fn circuit(&mut self, v: NodeId) -> bool {
        let mut found = false;
        self.path.push(v);
        self.blocked[v] = true;

        for i in 0..self.adjacency[v].len() {
            let w = self.adjacency[v][i];
            // Vertices below the root belong to earlier roots' cycles.
            if w < self.root {
                continue;
            }
            if w == self.root {
                self.record_cycle();
                found = true;
            } else if !self.blocked[w] && self.circuit(w) {
                found = true;
            }
            if self.exhausted {
                break;
            }
        }

        if found {
            self.unblock(v);
        } else {
            for i in 0..self.adjacency[v].len() {
                let w = self.adjacency[v][i];
                if w >= self.root && !self.block_lists[w].contains(&v) {
                    self.block_lists[w].push(v);
                }
            }
        }

        self.path.pop();
        found
    }

    fn record_cycle(&mut self) {
        self.examined += 1;
        let len = self.path.len();
        if len >= self.min_len && len <= self.max_len {
            self.retained.push(self.path.clone());
        }
        if self.examined >= self.budget {
            self.exhausted = true;
        }
    }

    fn unblock(&mut self, v: NodeId) {
        self.blocked[v] = false;
        let pending = std::mem::take(&mut self.block_lists[v]);
        for w in pending {
            if self.blocked[w] {
                self.unblock(w);
            }
        }
    }
}
