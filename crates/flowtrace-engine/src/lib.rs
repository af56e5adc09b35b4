//! # flowtrace-engine
//!
//! Detection stages and pipeline orchestration for transaction-network
//! forensics:
//! - `CycleDetector`: bounded enumeration of simple transaction cycles
//! - `SmurfingDetector`: dense fan-in / fan-out stars in a temporal window
//! - `ShellDetector`: weakly connected chains of pass-through shells
//! - `WhitelistFilter`: payroll / merchant false-positive suppression
//! - `Scorer`: explainable per-account evidence scoring
//! - `ForensicEngine`: runs the stages in order and assembles the report

pub mod cycles;
pub mod pipeline;
pub mod scoring;
pub mod shells;
pub mod smurfing;
pub mod whitelist;

pub use cycles::*;
pub use pipeline::*;
pub use scoring::*;
pub use shells::*;
pub use smurfing::*;
pub use whitelist::*;
