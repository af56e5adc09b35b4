//! Error types for the forensic detection pipeline.

use thiserror::Error;

/// Main error type for forensic analysis operations.
///
/// Detection-stage degradation (cycle budget exhaustion, centrality
/// fallback) is deliberately not an error: the affected stage yields its
/// empty default and the pipeline continues.
#[derive(Debug, Error)]
pub enum ForensicError {
    /// A required input column or field is absent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A cell could not be coerced to its expected type.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// IO error while reading a transaction source.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error while writing a report.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ForensicError {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Check whether this error was caused by the caller's input.
    ///
    /// A transport collaborator maps these to a client error response and
    /// everything else to a server error.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::ParseError(_))
    }
}

/// Result type alias for forensic analysis operations.
pub type ForensicResult<T> = Result<T, ForensicError>;
