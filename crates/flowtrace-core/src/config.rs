//! Detection thresholds and tunables.

use serde::{Deserialize, Serialize};

/// Tunable thresholds for the detection pipeline.
///
/// The defaults reproduce the production detection behaviour; individual
/// fields can be loosened or tightened for experiments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Maximum number of candidate cycles examined before enumeration
    /// stops. Cycles of every length count against the budget.
    pub cycle_budget: usize,
    /// Shortest cycle length retained.
    pub min_cycle_len: usize,
    /// Longest cycle length retained.
    pub max_cycle_len: usize,
    /// Minimum in- or out-degree for a smurfing hub.
    pub fan_threshold: usize,
    /// Window (hours) within which fan activity counts as a burst.
    pub fan_window_hours: f64,
    /// A smurfing ring is emitted only with more members than this.
    pub smurfing_member_floor: usize,
    /// A zero-in-degree emitter is payroll-like above this out-degree.
    pub whitelist_fanout: usize,
    /// Maximum distinct payout dates for a payroll-like emitter.
    pub whitelist_max_days: usize,
    /// Maximum number of betweenness source samples.
    pub betweenness_samples: usize,
    /// Seed for betweenness source sampling.
    pub betweenness_seed: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            cycle_budget: 5000,
            min_cycle_len: 3,
            max_cycle_len: 5,
            fan_threshold: 10,
            fan_window_hours: 72.0,
            smurfing_member_floor: 2,
            whitelist_fanout: 20,
            whitelist_max_days: 2,
            betweenness_samples: 50,
            betweenness_seed: 0x0f1a_7ace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = DetectionConfig::default();
        assert_eq!(config.cycle_budget, 5000);
        assert_eq!(config.min_cycle_len, 3);
        assert_eq!(config.max_cycle_len, 5);
        assert_eq!(config.fan_threshold, 10);
        assert_eq!(config.fan_window_hours, 72.0);
        assert_eq!(config.whitelist_fanout, 20);
        assert_eq!(config.betweenness_samples, 50);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = DetectionConfig {
            cycle_budget: 100,
            ..DetectionConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: DetectionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
