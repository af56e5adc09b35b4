//! Smurfing (fan-in / fan-out star) detection.
//!
//! A hub qualifies when at least `fan_threshold` edges point in (or out)
//! and the whole burst fits inside the temporal window. Hubs are scanned
//! in ascending account-id order and fan-in is evaluated before fan-out,
//! which fixes ring discovery order.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use flowtrace_core::DetectionConfig;
use flowtrace_graph::{NodeId, TransactionGraph};

/// Risk floor for a smurfing ring; each member adds one point.
const SMURFING_RISK_BASE: f64 = 70.0;

/// Direction of a smurfing star relative to its hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanDirection {
    FanIn,
    FanOut,
}

/// One smurfing ring candidate.
#[derive(Debug, Clone)]
pub struct SmurfingRing {
    /// The star's centre.
    pub hub: NodeId,
    pub direction: FanDirection,
    /// Hub plus distinct peers, ascending by account id.
    pub members: Vec<NodeId>,
    /// Ring risk in [0, 100].
    pub risk_score: f64,
}

/// Outcome of the smurfing stage.
#[derive(Debug, Default)]
pub struct SmurfingAnalysis {
    /// Fan tags per hub, fan-in before fan-out.
    pub tags: HashMap<NodeId, Vec<FanDirection>>,
    /// Ring candidates in detection order.
    pub rings: Vec<SmurfingRing>,
}

impl SmurfingAnalysis {
    /// Whether a hub carries the given tag.
    pub fn has_tag(&self, node: NodeId, direction: FanDirection) -> bool {
        self.tags
            .get(&node)
            .map(|tags| tags.contains(&direction))
            .unwrap_or(false)
    }
}

/// Scans every vertex for dense temporal fan-in and fan-out stars.
#[derive(Debug, Clone)]
pub struct SmurfingDetector {
    fan_threshold: usize,
    window_hours: f64,
    member_floor: usize,
}

impl SmurfingDetector {
    /// Creates a detector from pipeline configuration.
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self {
            fan_threshold: config.fan_threshold,
            window_hours: config.fan_window_hours,
            member_floor: config.smurfing_member_floor,
        }
    }

    /// Runs the per-vertex scan.
    pub fn detect(&self, graph: &TransactionGraph) -> SmurfingAnalysis {
        let mut analysis = SmurfingAnalysis::default();

        for hub in graph.nodes_by_account() {
            self.scan_side(graph, hub, FanDirection::FanIn, &mut analysis);
            self.scan_side(graph, hub, FanDirection::FanOut, &mut analysis);
        }

        debug!(
            hubs = analysis.tags.len(),
            rings = analysis.rings.len(),
            "smurfing scan complete"
        );
        analysis
    }

    fn scan_side(
        &self,
        graph: &TransactionGraph,
        hub: NodeId,
        direction: FanDirection,
        analysis: &mut SmurfingAnalysis,
    ) {
        let (peers, timestamps): (Vec<NodeId>, Vec<DateTime<Utc>>) = match direction {
            FanDirection::FanIn => graph.in_edges(hub).map(|(s, e)| (s, e.timestamp)).unzip(),
            FanDirection::FanOut => graph.out_edges(hub).map(|(t, e)| (t, e.timestamp)).unzip(),
        };

        if peers.len() < self.fan_threshold {
            return;
        }
        if !self.within_window(&timestamps) {
            return;
        }

        analysis.tags.entry(hub).or_default().push(direction);

        let mut members = peers;
        if !members.contains(&hub) {
            members.push(hub);
        }
        if members.len() <= self.member_floor {
            return;
        }
        members.sort_by(|&a, &b| graph.account(a).cmp(graph.account(b)));

        let risk_score = (SMURFING_RISK_BASE + members.len() as f64).min(100.0);
        analysis.rings.push(SmurfingRing {
            hub,
            direction,
            members,
            risk_score,
        });
    }

    /// Whether the burst's span fits inside the window.
    fn within_window(&self, timestamps: &[DateTime<Utc>]) -> bool {
        let mut sorted = timestamps.to_vec();
        sorted.sort_unstable();
        match (sorted.first(), sorted.last()) {
            (Some(first), Some(last)) => {
                let span_hours = (*last - *first).num_milliseconds() as f64 / 3_600_000.0;
                span_hours <= self.window_hours
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use flowtrace_graph::EdgeAttrs;

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn attrs(day: u32, hour: u32) -> EdgeAttrs {
        EdgeAttrs {
            amount: 500.0,
            timestamp: ts(day, hour),
        }
    }

    fn detector() -> SmurfingDetector {
        SmurfingDetector::from_config(&DetectionConfig::default())
    }

    fn fan_in_graph(senders: usize, span_days: u32) -> TransactionGraph {
        let mut graph = TransactionGraph::new();
        for i in 0..senders {
            let day = 1 + (i as u32 % span_days);
            graph.upsert_edge(&format!("S{i:02}"), "HUB", attrs(day, i as u32 % 24));
        }
        graph
    }

    #[test]
    fn test_fan_in_detected_within_window() {
        let graph = fan_in_graph(12, 2);
        let analysis = detector().detect(&graph);

        let hub = graph.node_id("HUB").unwrap();
        assert!(analysis.has_tag(hub, FanDirection::FanIn));
        assert!(!analysis.has_tag(hub, FanDirection::FanOut));

        assert_eq!(analysis.rings.len(), 1);
        let ring = &analysis.rings[0];
        assert_eq!(ring.members.len(), 13);
        assert_eq!(ring.risk_score, 83.0);
        assert_eq!(ring.direction, FanDirection::FanIn);
    }

    #[test]
    fn test_slow_fan_in_is_ignored() {
        // 12 senders spread over 8 days: span exceeds 72 h.
        let graph = fan_in_graph(12, 8);
        let analysis = detector().detect(&graph);
        assert!(analysis.tags.is_empty());
        assert!(analysis.rings.is_empty());
    }

    #[test]
    fn test_sparse_hub_is_ignored() {
        let graph = fan_in_graph(9, 1);
        let analysis = detector().detect(&graph);
        assert!(analysis.tags.is_empty());
    }

    #[test]
    fn test_fan_out_detected() {
        let mut graph = TransactionGraph::new();
        for i in 0..15 {
            graph.upsert_edge("HUB", &format!("R{i:02}"), attrs(1, i % 24));
        }

        let analysis = detector().detect(&graph);
        let hub = graph.node_id("HUB").unwrap();
        assert!(analysis.has_tag(hub, FanDirection::FanOut));
        assert_eq!(analysis.rings.len(), 1);
        assert_eq!(analysis.rings[0].members.len(), 16);
        assert_eq!(analysis.rings[0].risk_score, 86.0);
    }

    #[test]
    fn test_both_directions_fire_fan_in_first() {
        let mut graph = TransactionGraph::new();
        for i in 0..10 {
            graph.upsert_edge(&format!("S{i:02}"), "HUB", attrs(1, i));
        }
        for i in 0..10 {
            graph.upsert_edge("HUB", &format!("R{i:02}"), attrs(2, i));
        }

        let analysis = detector().detect(&graph);
        let hub = graph.node_id("HUB").unwrap();
        assert_eq!(
            analysis.tags.get(&hub),
            Some(&vec![FanDirection::FanIn, FanDirection::FanOut])
        );
        assert_eq!(analysis.rings.len(), 2);
        assert_eq!(analysis.rings[0].direction, FanDirection::FanIn);
        assert_eq!(analysis.rings[1].direction, FanDirection::FanOut);
    }

    #[test]
    fn test_members_sorted_by_account_id() {
        let mut graph = TransactionGraph::new();
        // Insert senders in descending name order.
        for i in (0..12).rev() {
            graph.upsert_edge(&format!("S{i:02}"), "AAA_HUB", attrs(1, i % 24));
        }

        let analysis = detector().detect(&graph);
        let names: Vec<&str> = analysis.rings[0]
            .members
            .iter()
            .map(|&m| graph.account(m))
            .collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert!(names.contains(&"AAA_HUB"));
    }

    #[test]
    fn test_hub_scan_order_is_ascending() {
        // Two independent hubs; ring order must follow account ids.
        let mut graph = TransactionGraph::new();
        for i in 0..10 {
            graph.upsert_edge(&format!("ZS{i:02}"), "Z_HUB", attrs(1, i));
        }
        for i in 0..10 {
            graph.upsert_edge(&format!("AS{i:02}"), "A_HUB", attrs(1, i));
        }

        let analysis = detector().detect(&graph);
        assert_eq!(analysis.rings.len(), 2);
        assert_eq!(graph.account(analysis.rings[0].hub), "A_HUB");
        assert_eq!(graph.account(analysis.rings[1].hub), "Z_HUB");
    }
}
