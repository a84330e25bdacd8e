//! Sink trait and error types
//!
//! A sink is the append-only destination of one output target. It owns the
//! Processed-Set of that target, so "already written?" and "write" are always
//! answered by the same object.

use crate::extract::{ListingRecord, Schema};
use thiserror::Error;

/// Errors that can occur while opening or writing a sink
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Existing output {path} does not fit the schema: {message}")]
    HeaderMismatch { path: String, message: String },

    #[error("Record of schema '{found}' sent to a '{expected}' sink")]
    SchemaMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Result of a single append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The record was persisted and synced
    Written,
    /// A record with the same ListingURL already exists; nothing was written
    Duplicate,
}

/// Append-only, key-deduplicated persistence
pub trait Sink: Send {
    /// Schema of the records this sink stores
    fn schema(&self) -> &'static Schema;

    /// Human-readable destination, for logs
    fn describe(&self) -> String;

    /// Returns true if a record with this ListingURL is already persisted
    fn contains(&self, key: &str) -> bool;

    /// Persists a record unless its key is already present
    ///
    /// A `Written` outcome means the row is durable before this returns.
    fn append(&mut self, record: &ListingRecord) -> SinkResult<AppendOutcome>;

    /// Number of persisted keys
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rejects records built for another schema
pub(crate) fn check_schema(sink: &'static Schema, record: &ListingRecord) -> SinkResult<()> {
    if std::ptr::eq(sink, record.schema()) {
        Ok(())
    } else {
        Err(SinkError::SchemaMismatch {
            expected: sink.name,
            found: record.schema().name,
        })
    }
}
