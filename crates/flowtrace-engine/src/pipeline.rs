//! The forensic detection pipeline.
//!
//! Stages run in strict order over one batch: graph build, cycle
//! enumeration, smurfing scan, shell grouping, whitelist, centrality,
//! then scoring and report assembly. The assembler owns the ring counter:
//! detectors hand over candidates in fixed traversal order and ids are
//! stamped cycles first, then smurfing rings, then shell networks.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use tracing::info;

use flowtrace_core::{
    ring_id, round2, round4, CentralityScores, DetectionConfig, ForensicResult, FraudRing,
    GraphLinkView, GraphNodeView, GraphView, Report, ReportSummary, RingPattern,
    SuspiciousAccount, TransactionRecord, RING_NONE,
};
use flowtrace_graph::{CentralityComputer, CentralityMaps, GraphBuilder, NodeId, TransactionGraph};

use crate::cycles::{CycleAnalysis, CycleDetector};
use crate::scoring::Scorer;
use crate::shells::{ShellAnalysis, ShellDetector, SHELL_RISK_SCORE};
use crate::smurfing::{FanDirection, SmurfingAnalysis, SmurfingDetector};
use crate::whitelist::WhitelistFilter;

/// Runs the detection stages and assembles the forensic report.
#[derive(Debug, Clone, Default)]
pub struct ForensicEngine {
    config: DetectionConfig,
}

impl ForensicEngine {
    /// Creates an engine with the given configuration.
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    /// The engine's configuration.
    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Runs the full pipeline over a fallible transaction source.
    pub fn analyze<I>(&self, source: I) -> ForensicResult<Report>
    where
        I: IntoIterator<Item = ForensicResult<TransactionRecord>>,
    {
        let started = Instant::now();

        let graph = GraphBuilder::from_source(source)?;
        info!(
            accounts = graph.node_count(),
            edges = graph.edge_count(),
            "transaction graph built"
        );

        let cycles = CycleDetector::from_config(&self.config).detect(&graph);
        let smurfing = SmurfingDetector::from_config(&self.config).detect(&graph);
        let shells = ShellDetector::new().detect(&graph);
        let whitelist = WhitelistFilter::from_config(&self.config).detect(&graph);
        let centrality =
            CentralityComputer::new(self.config.betweenness_samples, self.config.betweenness_seed)
                .compute(&graph);

        let (fraud_rings, node_ring_map) = stamp_rings(&graph, &cycles, &smurfing, &shells);

        let scorer = Scorer::new(&graph, &cycles, &smurfing, &shells, &centrality);
        let mut scores: HashMap<NodeId, f64> = HashMap::new();
        let mut suspicious_accounts = Vec::new();

        for v in candidates(&graph, &cycles, &smurfing, &shells) {
            if whitelist.contains(&v) {
                continue;
            }
            let (score, tags) = scorer.score(v);
            if score > 0.0 {
                scores.insert(v, score);
                suspicious_accounts.push(SuspiciousAccount {
                    account_id: graph.account(v).to_string(),
                    suspicion_score: score,
                    detected_patterns: tags,
                    ring_id: node_ring_map
                        .get(&v)
                        .cloned()
                        .unwrap_or_else(|| RING_NONE.to_string()),
                    centrality: CentralityScores {
                        degree: round4(centrality.degree[v]),
                        betweenness: round4(centrality.betweenness[v]),
                    },
                });
            }
        }
        suspicious_accounts.sort_by(|a, b| b.suspicion_score.total_cmp(&a.suspicion_score));

        let graph_view = assemble_graph_view(&graph, &cycles, &smurfing, &centrality, &scores);

        let summary = ReportSummary {
            total_accounts_analyzed: graph.node_count(),
            suspicious_accounts_flagged: suspicious_accounts.len(),
            fraud_rings_detected: fraud_rings.len(),
            processing_time_seconds: round2(started.elapsed().as_secs_f64()),
        };
        info!(
            accounts = summary.total_accounts_analyzed,
            flagged = summary.suspicious_accounts_flagged,
            rings = summary.fraud_rings_detected,
            "analysis complete"
        );

        Ok(Report {
            suspicious_accounts,
            fraud_rings,
            summary,
            graph: graph_view,
        })
    }

    /// Convenience wrapper over already-validated records.
    pub fn analyze_records(&self, records: &[TransactionRecord]) -> ForensicResult<Report> {
        self.analyze(records.iter().cloned().map(Ok))
    }
}

/// Stamps ring ids over the candidate streams and replays the
/// node-to-ring assignment rules in the same order.
fn stamp_rings(
    graph: &TransactionGraph,
    cycles: &CycleAnalysis,
    smurfing: &SmurfingAnalysis,
    shells: &ShellAnalysis,
) -> (Vec<FraudRing>, HashMap<NodeId, String>) {
    let mut rings = Vec::new();
    let mut node_ring_map: HashMap<NodeId, String> = HashMap::new();
    let mut counter = 0usize;

    for ring in &cycles.rings {
        counter += 1;
        let id = ring_id(counter);
        for &member in &ring.members {
            node_ring_map.insert(member, id.clone());
        }
        rings.push(FraudRing {
            ring_id: id,
            members: account_names(graph, &ring.members),
            pattern_type: RingPattern::CycleLength(ring.members.len()),
            risk_score: ring.risk_score,
        });
    }

    for ring in &smurfing.rings {
        counter += 1;
        let id = ring_id(counter);
        // The hub always takes the newest ring; peers keep earlier ones.
        node_ring_map.insert(ring.hub, id.clone());
        for &member in &ring.members {
            node_ring_map.entry(member).or_insert_with(|| id.clone());
        }
        rings.push(FraudRing {
            ring_id: id,
            members: account_names(graph, &ring.members),
            pattern_type: match ring.direction {
                FanDirection::FanIn => RingPattern::SmurfingFanIn,
                FanDirection::FanOut => RingPattern::SmurfingFanOut,
            },
            risk_score: ring.risk_score,
        });
    }

    for component in &shells.components {
        counter += 1;
        let id = ring_id(counter);
        for &member in component {
            node_ring_map.insert(member, id.clone());
        }
        rings.push(FraudRing {
            ring_id: id,
            members: account_names(graph, component),
            pattern_type: RingPattern::LayeredShellNetwork,
            risk_score: SHELL_RISK_SCORE,
        });
    }

    (rings, node_ring_map)
}

/// Candidate vertices in ascending account-id order.
fn candidates(
    graph: &TransactionGraph,
    cycles: &CycleAnalysis,
    smurfing: &SmurfingAnalysis,
    shells: &ShellAnalysis,
) -> Vec<NodeId> {
    let mut set: HashSet<NodeId> = HashSet::new();
    set.extend(cycles.cycles_by_node.keys().copied());
    set.extend(smurfing.tags.keys().copied());
    set.extend(shells.shell_nodes.iter().copied());

    let mut ordered: Vec<NodeId> = set.into_iter().collect();
    ordered.sort_by(|&a, &b| graph.account(a).cmp(graph.account(b)));
    ordered
}

/// Builds the annotated node/link view of the whole network.
fn assemble_graph_view(
    graph: &TransactionGraph,
    cycles: &CycleAnalysis,
    smurfing: &SmurfingAnalysis,
    centrality: &CentralityMaps,
    scores: &HashMap<NodeId, f64>,
) -> GraphView {
    let ring_edges = collect_ring_edges(graph, cycles, smurfing);

    let nodes = graph
        .nodes()
        .map(|v| GraphNodeView {
            id: graph.account(v).to_string(),
            in_degree: graph.in_degree(v),
            out_degree: graph.out_degree(v),
            suspicious: scores.contains_key(&v),
            score: scores.get(&v).copied().unwrap_or(0.0),
            centrality_score: round4(centrality.betweenness[v]),
        })
        .collect();

    let links = graph
        .edges()
        .map(|(source, target, edge)| GraphLinkView {
            source: graph.account(source).to_string(),
            target: graph.account(target).to_string(),
            amount: edge.amount,
            timestamp: edge.timestamp.to_rfc3339(),
            is_ring: ring_edges.contains(&(source, target)),
        })
        .collect();

    GraphView { nodes, links }
}

/// Edges highlighted in the graph view: the hops of retained cycles plus
/// any existing edge between two members of one smurfing ring.
fn collect_ring_edges(
    graph: &TransactionGraph,
    cycles: &CycleAnalysis,
    smurfing: &SmurfingAnalysis,
) -> HashSet<(NodeId, NodeId)> {
    let mut ring_edges = HashSet::new();

    for ring in &cycles.rings {
        let members = &ring.members;
        for j in 0..members.len() {
            ring_edges.insert((members[j], members[(j + 1) % members.len()]));
        }
    }

    for ring in &smurfing.rings {
        let members: HashSet<NodeId> = ring.members.iter().copied().collect();
        for &member in &ring.members {
            for (target, _) in graph.out_edges(member) {
                if members.contains(&target) {
                    ring_edges.insert((member, target));
                }
            }
        }
    }

    ring_edges
}

fn account_names(graph: &TransactionGraph, members: &[NodeId]) -> Vec<String> {
    members.iter().map(|&m| graph.account(m).to_string()).collect()
}
