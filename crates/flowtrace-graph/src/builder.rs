//! Graph construction from a transaction source.

use flowtrace_core::{ForensicResult, TransactionRecord};
use tracing::debug;

use crate::graph::{EdgeAttrs, TransactionGraph};

/// Builds a [`TransactionGraph`] from a stream of transaction records.
///
/// Sources are fallible: the builder drains records until the stream ends
/// or yields its first error, which aborts the build.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: TransactionGraph,
    records_seen: usize,
}

impl GraphBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one record. A later record for the same (sender, receiver)
    /// pair replaces the earlier edge attributes.
    pub fn add_record(&mut self, record: &TransactionRecord) {
        self.graph.upsert_edge(
            &record.sender_id,
            &record.receiver_id,
            EdgeAttrs {
                amount: record.amount,
                timestamp: record.timestamp,
            },
        );
        self.records_seen += 1;
    }

    /// Drains a fallible source, stopping at the first source error.
    pub fn add_source<I>(&mut self, source: I) -> ForensicResult<()>
    where
        I: IntoIterator<Item = ForensicResult<TransactionRecord>>,
    {
        for record in source {
            self.add_record(&record?);
        }
        Ok(())
    }

    /// Finishes the build and returns the graph.
    pub fn build(self) -> TransactionGraph {
        debug!(
            records = self.records_seen,
            accounts = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "graph build complete"
        );
        self.graph
    }

    /// Builds a graph directly from a fallible source.
    pub fn from_source<I>(source: I) -> ForensicResult<TransactionGraph>
    where
        I: IntoIterator<Item = ForensicResult<TransactionRecord>>,
    {
        let mut builder = Self::new();
        builder.add_source(source)?;
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use flowtrace_core::ForensicError;

    fn record(sender: &str, receiver: &str, amount: f64, hour: u32) -> TransactionRecord {
        TransactionRecord::new(
            format!("TX_{sender}_{receiver}_{hour}"),
            sender,
            receiver,
            amount,
            Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_build_from_records() {
        let records = vec![
            record("A", "B", 100.0, 1),
            record("B", "C", 200.0, 2),
            record("A", "B", 300.0, 3),
        ];

        let graph = GraphBuilder::from_source(records.into_iter().map(Ok)).unwrap();

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);

        let a = graph.node_id("A").unwrap();
        let b = graph.node_id("B").unwrap();
        assert_eq!(graph.edge(a, b).unwrap().amount, 300.0);
    }

    #[test]
    fn test_source_error_aborts_build() {
        let source: Vec<ForensicResult<TransactionRecord>> = vec![
            Ok(record("A", "B", 100.0, 1)),
            Err(ForensicError::parse("bad amount 'abc'")),
            Ok(record("B", "C", 200.0, 2)),
        ];

        let err = GraphBuilder::from_source(source).unwrap_err();
        assert!(err.to_string().contains("bad amount"));
    }
}
