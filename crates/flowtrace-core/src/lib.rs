//! # flowtrace-core
//!
//! Core domain models, configuration, and error types for the forensic
//! detection pipeline.
//!
//! This crate provides the foundational types used throughout flowtrace:
//! - Transaction records as produced by a transaction source
//! - Pattern tags and ring pattern classifications
//! - Report types (suspicious accounts, fraud rings, graph view, summary)
//! - Detection thresholds with production defaults

pub mod config;
pub mod error;
pub mod model;

pub use config::*;
pub use error::*;
pub use model::*;
