//! # chunkfold
//!
//! Ingest delimited text that is too large, or too open-ended, to read in one
//! pass. Input is pulled in fixed-size byte windows, complete records are
//! reconstructed across window boundaries, each record is parsed into a row,
//! and rows are folded into a registry keyed by their primary field. The
//! registry is finally rendered as a JSON document.
//!
//! ## Quick Start
//!
//! ```
//! use chunkfold::{ingest_reader, IngestConfig};
//! # fn main() -> anyhow::Result<()> {
//! let input = "alice,Alice,Smith,a@x.com\nbob,Bob,Jones,b@x.com\n";
//! let report = ingest_reader(input.as_bytes(), &IngestConfig::default().with_window_size(10))?;
//!
//! assert_eq!(report.registry.len(), 2);
//! println!("{}", report.render()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! ChunkReader -> BoundaryResolver -> RowParser -> Registry -> output
//! ```
//!
//! - [`ChunkReader`] pulls fixed-size windows and reports end-of-stream
//! - [`BoundaryResolver`] carries the unterminated fragment between windows
//!   and emits complete records in order, each exactly once
//! - [`RowParser`] turns a record into a row; [`CsvRowParser`] is the default
//! - [`Registry`] keeps the latest row per key (last write wins)
//! - [`output`] renders the registry as pretty-printed JSON
//!
//! All state of a run lives in one [`IngestSession`].
//!
//! ## Policies
//!
//! Three situations have no single right answer and are configured explicitly
//! in [`IngestConfig`]:
//!
//! - empty records: skip (default) or reject ([`EmptyRecordPolicy`])
//! - malformed records: skip and log (default) or fail fast
//!   ([`ParseFailurePolicy`])
//! - bytes left unterminated at end-of-stream: error (default) or accept as a
//!   final record ([`TruncatedTailPolicy`])
//!
//! ## Feature Flags
//!
//! - `parallel-parse` - parse large batches on the rayon pool
//! - `compression-gzip`, `compression-zstd`, `compression-bzip2`,
//!   `compression-xz` - transparent decompression in [`ingest_file`]

pub mod boundary;
pub mod cancel;
pub mod config;
pub mod error;
pub mod ingest;
pub mod io;
pub mod metrics;
pub mod output;
pub mod registry;
pub mod rejects;
pub mod row;
pub mod testing;

pub use boundary::{BoundaryResolver, Record};
pub use cancel::CancellationToken;
pub use config::{EmptyRecordPolicy, IngestConfig, ParseFailurePolicy, TruncatedTailPolicy};
pub use error::{IngestError, ParseFailureReason, RecordParseError};
pub use ingest::{IngestReport, IngestSession, ingest, ingest_file, ingest_reader};
pub use io::{ChunkReader, Window};
pub use metrics::IngestMetrics;
pub use registry::Registry;
pub use rejects::RejectLog;
pub use row::{CsvRowParser, Keyed, RowParser, UserRecord};
