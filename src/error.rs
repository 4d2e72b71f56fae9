//! Error types for ingestion.
//!
//! Every failure the core can produce is an [`IngestError`] variant. Record
//! level problems are carried by [`RecordParseError`], which is also what the
//! [`RejectLog`](crate::rejects::RejectLog) stores when ingestion is configured
//! to skip bad records instead of aborting.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a single record could not become a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseFailureReason {
    /// The record had no bytes between two delimiters.
    Empty,
    /// The record split into the wrong number of fields.
    FieldCount { expected: usize, found: usize },
    /// The row parser rejected the record's content.
    Malformed { message: String },
}

impl fmt::Display for ParseFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty record"),
            Self::FieldCount { expected, found } => {
                write!(f, "expected {expected} fields, found {found}")
            }
            Self::Malformed { message } => write!(f, "{message}"),
        }
    }
}

/// A record that failed to parse, with enough context to find it in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("record #{index} at byte {offset}: {reason} ({raw:?})")]
pub struct RecordParseError {
    /// 0-based sequence number of the record in the stream.
    pub index: u64,
    /// Byte offset of the record's first byte.
    pub offset: u64,
    /// The record's bytes, lossily decoded.
    pub raw: String,
    pub reason: ParseFailureReason,
}

/// Failures that end an ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("read failed at byte {offset}")]
    StreamRead {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    RecordParse(#[from] RecordParseError),

    #[error("stream ended inside a record: {len} unterminated bytes at byte {offset}")]
    TruncatedTail { offset: u64, len: usize },

    #[error("record at byte {offset} exceeds {limit} bytes")]
    RecordTooLong { offset: u64, limit: usize },

    #[error("ingestion cancelled at byte {offset}")]
    Cancelled { offset: u64 },

    #[error("failed to render registry: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
