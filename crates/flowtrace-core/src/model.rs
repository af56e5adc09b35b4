//! Domain models for transactions, rings, and the forensic report.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Sentinel ring id for accounts that belong to no ring.
pub const RING_NONE: &str = "RING_NONE";

/// Formats the n-th ring id (1-based) as `RING_###`.
pub fn ring_id(n: usize) -> String {
    format!("RING_{n:03}")
}

/// Rounds to two decimal places.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Rounds to four decimal places.
pub fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// A single financial transaction in typed form.
///
/// Sources coerce raw cells into this shape before the pipeline sees them;
/// timestamps are parsed exactly once at ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Unique transaction identifier.
    pub transaction_id: String,
    /// Account the funds left.
    pub sender_id: String,
    /// Account the funds reached.
    pub receiver_id: String,
    /// Transferred amount.
    pub amount: f64,
    /// Instant the transaction settled.
    pub timestamp: DateTime<Utc>,
}

impl TransactionRecord {
    /// Creates a record from its five required fields.
    pub fn new(
        transaction_id: impl Into<String>,
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        amount: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            amount,
            timestamp,
        }
    }
}

/// Structural pattern evidence attached to a suspicious account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternTag {
    /// Member of a transaction cycle of the given length.
    CycleLength(usize),
    /// Hub of a dense incoming star.
    SmurfingFanIn,
    /// Hub of a dense outgoing star.
    SmurfingFanOut,
    /// Part of a connected chain of pass-through shells.
    LayeredShell,
    /// High betweenness centrality relative to the network.
    HighCentralityBridge,
}

impl fmt::Display for PatternTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CycleLength(k) => write!(f, "cycle_length_{k}"),
            Self::SmurfingFanIn => f.write_str("smurfing_fan_in"),
            Self::SmurfingFanOut => f.write_str("smurfing_fan_out"),
            Self::LayeredShell => f.write_str("layered_shell"),
            Self::HighCentralityBridge => f.write_str("high_centrality_bridge"),
        }
    }
}

impl Serialize for PatternTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Classification of a fraud ring by the topology that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RingPattern {
    /// Closed transaction loop of the given length.
    CycleLength(usize),
    /// Many senders converging on one hub in a short window.
    SmurfingFanIn,
    /// One hub dispersing to many receivers in a short window.
    SmurfingFanOut,
    /// Weakly connected component of pass-through shells.
    LayeredShellNetwork,
}

impl fmt::Display for RingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CycleLength(k) => write!(f, "cycle_length_{k}"),
            Self::SmurfingFanIn => f.write_str("smurfing_fan_in"),
            Self::SmurfingFanOut => f.write_str("smurfing_fan_out"),
            Self::LayeredShellNetwork => f.write_str("layered_shell_network"),
        }
    }
}

impl Serialize for RingPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A detected group of accounts jointly flagged under one pattern.
#[derive(Debug, Clone, Serialize)]
pub struct FraudRing {
    /// Stable id of the form `RING_###`, assigned in discovery order.
    pub ring_id: String,
    /// Member account ids. Cycle members are in cycle order; other
    /// patterns list members in ascending account-id order.
    pub members: Vec<String>,
    /// Topology that produced the ring.
    pub pattern_type: RingPattern,
    /// Ring risk in [0, 100].
    pub risk_score: f64,
}

/// Degree and betweenness centrality of one account, rounded for output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CentralityScores {
    pub degree: f64,
    pub betweenness: f64,
}

/// One flagged account with its explainable evidence.
#[derive(Debug, Clone, Serialize)]
pub struct SuspiciousAccount {
    pub account_id: String,
    /// Combined evidence score in [0, 100].
    pub suspicion_score: f64,
    /// Pattern tags in evidence order, deduplicated.
    pub detected_patterns: Vec<PatternTag>,
    /// Most recently assigned ring id, or [`RING_NONE`].
    pub ring_id: String,
    pub centrality: CentralityScores,
}

/// One vertex of the annotated graph view.
#[derive(Debug, Clone, Serialize)]
pub struct GraphNodeView {
    pub id: String,
    pub in_degree: usize,
    pub out_degree: usize,
    pub suspicious: bool,
    /// Suspicion score of the account, 0 when not flagged.
    pub score: f64,
    /// Betweenness centrality.
    pub centrality_score: f64,
}

/// One edge of the annotated graph view.
#[derive(Debug, Clone, Serialize)]
pub struct GraphLinkView {
    pub source: String,
    pub target: String,
    pub amount: f64,
    /// ISO-8601 instant.
    pub timestamp: String,
    /// Whether the edge participates in a detected ring.
    pub is_ring: bool,
}

/// Annotated transaction network for visualisation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GraphView {
    pub nodes: Vec<GraphNodeView>,
    pub links: Vec<GraphLinkView>,
}

/// Aggregate counters for one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub total_accounts_analyzed: usize,
    pub suspicious_accounts_flagged: usize,
    pub fraud_rings_detected: usize,
    /// Wall-clock duration of the run, two decimals.
    pub processing_time_seconds: f64,
}

/// The forensic report produced by one `analyze` invocation.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Flagged accounts, sorted by suspicion score descending.
    pub suspicious_accounts: Vec<SuspiciousAccount>,
    /// Detected rings in discovery order.
    pub fraud_rings: Vec<FraudRing>,
    pub summary: ReportSummary,
    #[serde(rename = "_graph")]
    pub graph: GraphView,
}
