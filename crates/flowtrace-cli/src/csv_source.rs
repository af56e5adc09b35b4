//! CSV-backed transaction source.
//!
//! The five required columns may appear in any order; extra columns are
//! ignored. Header problems surface as `InvalidInput` before any record is
//! yielded, cell problems as `ParseError` naming the offending value.

use std::io;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::StringRecord;

use flowtrace_core::{ForensicError, ForensicResult, TransactionRecord};

const REQUIRED_COLUMNS: [&str; 5] = [
    "transaction_id",
    "sender_id",
    "receiver_id",
    "amount",
    "timestamp",
];

/// Column positions of the required fields in one CSV layout.
#[derive(Debug, Clone, Copy)]
struct ColumnLayout {
    transaction_id: usize,
    sender_id: usize,
    receiver_id: usize,
    amount: usize,
    timestamp: usize,
}

impl ColumnLayout {
    fn from_headers(headers: &StringRecord) -> ForensicResult<Self> {
        let position = |name: &str| -> ForensicResult<usize> {
            headers.iter().position(|h| h == name).ok_or_else(|| {
                ForensicError::invalid_input(format!(
                    "missing required column '{name}' (need: {})",
                    REQUIRED_COLUMNS.join(", ")
                ))
            })
        };

        Ok(Self {
            transaction_id: position("transaction_id")?,
            sender_id: position("sender_id")?,
            receiver_id: position("receiver_id")?,
            amount: position("amount")?,
            timestamp: position("timestamp")?,
        })
    }
}

/// Streams [`TransactionRecord`]s out of a CSV reader.
pub struct CsvTransactionSource<R: io::Read> {
    records: csv::StringRecordsIntoIter<R>,
    layout: ColumnLayout,
    line: usize,
}

impl<R: io::Read> CsvTransactionSource<R> {
    /// Opens the source, validating the header row eagerly.
    pub fn new(reader: R) -> ForensicResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| ForensicError::invalid_input(format!("unreadable CSV header: {e}")))?;
        let layout = ColumnLayout::from_headers(headers)?;

        Ok(Self {
            records: csv_reader.into_records(),
            layout,
            line: 1,
        })
    }

    fn coerce(&self, record: &StringRecord) -> ForensicResult<TransactionRecord> {
        let field = |index: usize, name: &str| -> ForensicResult<&str> {
            record.get(index).ok_or_else(|| {
                ForensicError::invalid_input(format!("row {}: missing '{name}' cell", self.line))
            })
        };

        let transaction_id = field(self.layout.transaction_id, "transaction_id")?;
        let sender_id = field(self.layout.sender_id, "sender_id")?;
        let receiver_id = field(self.layout.receiver_id, "receiver_id")?;
        if transaction_id.is_empty() || sender_id.is_empty() || receiver_id.is_empty() {
            return Err(ForensicError::invalid_input(format!(
                "row {}: empty id field",
                self.line
            )));
        }

        let amount_cell = field(self.layout.amount, "amount")?;
        let amount: f64 = amount_cell.parse().map_err(|_| {
            ForensicError::parse(format!(
                "row {}: amount '{amount_cell}' is not a number",
                self.line
            ))
        })?;

        let timestamp_cell = field(self.layout.timestamp, "timestamp")?;
        let timestamp = parse_timestamp(timestamp_cell).ok_or_else(|| {
            ForensicError::parse(format!(
                "row {}: timestamp '{timestamp_cell}' is not an instant",
                self.line
            ))
        })?;

        Ok(TransactionRecord::new(
            transaction_id,
            sender_id,
            receiver_id,
            amount,
            timestamp,
        ))
    }
}

impl<R: io::Read> Iterator for CsvTransactionSource<R> {
    type Item = ForensicResult<TransactionRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        self.line += 1;
        Some(match record {
            Ok(record) => self.coerce(&record),
            Err(e) => Err(ForensicError::parse(format!(
                "row {}: unreadable CSV record: {e}",
                self.line
            ))),
        })
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (with or without a `T`), or a
/// bare `YYYY-MM-DD` date. Naive forms are taken as UTC.
fn parse_timestamp(cell: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(cell) {
        return Some(instant.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(cell, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(cell, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    None
}
