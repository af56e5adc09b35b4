//! Explainable per-account suspicion scoring.
//!
//! The score is an additive sum of structural evidence, rounded and
//! clamped to [0, 100], then boosted when the account bridges the wider
//! network. Every contribution maps onto a pattern tag so an investigator
//! can see why an account was flagged.

use flowtrace_core::{round2, PatternTag};
use flowtrace_graph::{CentralityMaps, NodeId, TransactionGraph};

use crate::cycles::CycleAnalysis;
use crate::shells::ShellAnalysis;
use crate::smurfing::{FanDirection, SmurfingAnalysis};

/// Base weight for any cycle membership.
const CYCLE_WEIGHT: f64 = 50.0;
/// Extra weight per cycle the account sits on, capped.
const CYCLE_COUNT_WEIGHT: f64 = 10.0;
const CYCLE_COUNT_CAP: f64 = 30.0;
/// Weight for layered shell membership.
const SHELL_WEIGHT: f64 = 40.0;
/// Weight for dispersing a fan-out burst.
const FAN_OUT_WEIGHT: f64 = 35.0;
/// Weight for aggregating a fan-in burst and moving the money onward.
const FAN_IN_FORWARDING_WEIGHT: f64 = 30.0;
/// Discount for fan-in sinks; pure collectors are usually merchants.
const FAN_IN_SINK_DISCOUNT: f64 = -10.0;
/// Weight for heavy two-way pass-through traffic.
const VELOCITY_WEIGHT: f64 = 15.0;
/// Both degrees must exceed this for the velocity weight.
const VELOCITY_DEGREE: usize = 5;
/// Betweenness above which the bridge boost applies.
const BRIDGE_BETWEENNESS: f64 = 0.1;
/// Score added for bridging accounts.
const BRIDGE_BOOST: f64 = 15.0;
/// Boosted score above which the bridge tag is attached.
const BRIDGE_TAG_FLOOR: f64 = 50.0;

/// Scores candidate accounts against the assembled stage evidence.
pub struct Scorer<'a> {
    graph: &'a TransactionGraph,
    cycles: &'a CycleAnalysis,
    smurfing: &'a SmurfingAnalysis,
    shells: &'a ShellAnalysis,
    centrality: &'a CentralityMaps,
}

impl<'a> Scorer<'a> {
    /// Creates a scorer over the stage outputs.
    pub fn new(
        graph: &'a TransactionGraph,
        cycles: &'a CycleAnalysis,
        smurfing: &'a SmurfingAnalysis,
        shells: &'a ShellAnalysis,
        centrality: &'a CentralityMaps,
    ) -> Self {
        Self {
            graph,
            cycles,
            smurfing,
            shells,
            centrality,
        }
    }

    /// Evidence subtotal for one vertex, rounded and clamped to [0, 100].
    pub fn base_score(&self, v: NodeId) -> f64 {
        let mut score = 0.0;
        let in_degree = self.graph.in_degree(v);
        let out_degree = self.graph.out_degree(v);

        let cycle_count = self.cycles.cycle_count(v);
        if cycle_count > 0 {
            score += CYCLE_WEIGHT
                + (CYCLE_COUNT_WEIGHT * cycle_count as f64).min(CYCLE_COUNT_CAP);
        }

        if self.shells.contains(v) {
            score += SHELL_WEIGHT;
        }

        if self.smurfing.has_tag(v, FanDirection::FanOut) {
            score += FAN_OUT_WEIGHT;
        }

        if self.smurfing.has_tag(v, FanDirection::FanIn) {
            if out_degree > 0 {
                score += FAN_IN_FORWARDING_WEIGHT;
            } else {
                score += FAN_IN_SINK_DISCOUNT;
            }
        }

        if in_degree > VELOCITY_DEGREE && out_degree > VELOCITY_DEGREE {
            score += VELOCITY_WEIGHT;
        }

        round2(score).clamp(0.0, 100.0)
    }

    /// Final score and ordered, deduplicated pattern tags for one vertex.
    pub fn score(&self, v: NodeId) -> (f64, Vec<PatternTag>) {
        let base = self.base_score(v);
        let mut score = base;

        let mut tags: Vec<PatternTag> = self
            .cycles
            .cycle_lengths(v)
            .into_iter()
            .map(PatternTag::CycleLength)
            .collect();
        if self.smurfing.has_tag(v, FanDirection::FanIn) {
            tags.push(PatternTag::SmurfingFanIn);
        }
        if self.smurfing.has_tag(v, FanDirection::FanOut) {
            tags.push(PatternTag::SmurfingFanOut);
        }
        if self.shells.contains(v) {
            tags.push(PatternTag::LayeredShell);
        }

        if self.centrality.betweenness.get(v).copied().unwrap_or(0.0) > BRIDGE_BETWEENNESS {
            score = (base + BRIDGE_BOOST).min(100.0);
            if score > BRIDGE_TAG_FLOOR {
                tags.push(PatternTag::HighCentralityBridge);
            }
        }

        dedup_preserving_order(&mut tags);
        (score, tags)
    }
}

/// Removes repeated tags, keeping each first occurrence.
fn dedup_preserving_order(tags: &mut Vec<PatternTag>) {
    let mut seen = Vec::with_capacity(tags.len());
    tags.retain(|tag| {
        if seen.contains(tag) {
            false
        } else {
            seen.push(*tag);
            true
        }
    });
}
