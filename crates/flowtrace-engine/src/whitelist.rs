//! Payroll / merchant false-positive suppression.
//!
//! A payroll emitter looks like a smurfing fan-out from the inside: one
//! account paying dozens of others in a burst. The distinguishing shape is
//! zero inflow (salaries come from business capital outside the analysed
//! set) and payouts bunched on one or two calendar dates.

use std::collections::HashSet;

use tracing::debug;

use flowtrace_core::DetectionConfig;
use flowtrace_graph::{NodeId, TransactionGraph};

/// Identifies accounts exempt from the suspicious-accounts output.
///
/// Whitelisting filters the account list only; rings that reference a
/// whitelisted account remain in the report.
#[derive(Debug, Clone)]
pub struct WhitelistFilter {
    min_fanout: usize,
    max_days: usize,
}

impl WhitelistFilter {
    /// Creates a filter from pipeline configuration.
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self {
            min_fanout: config.whitelist_fanout,
            max_days: config.whitelist_max_days,
        }
    }

    /// Returns the whitelisted vertex set.
    pub fn detect(&self, graph: &TransactionGraph) -> HashSet<NodeId> {
        let mut whitelist = HashSet::new();

        for v in graph.nodes() {
            if graph.out_degree(v) <= self.min_fanout || graph.in_degree(v) != 0 {
                continue;
            }

            let payout_dates: HashSet<_> = graph
                .out_edges(v)
                .map(|(_, edge)| edge.timestamp.date_naive())
                .collect();
            if payout_dates.len() <= self.max_days {
                whitelist.insert(v);
            }
        }

        debug!(whitelisted = whitelist.len(), "whitelist scan complete");
        whitelist
    }
}
