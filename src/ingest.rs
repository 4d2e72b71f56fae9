//! The ingestion loop.
//!
//! An [`IngestSession`] owns all state of one run: the carried fragment (inside
//! its [`BoundaryResolver`]), the registry being built, the reject list and the
//! metrics. Nothing is global, so independent runs never interfere.
//!
//! The drivers [`ingest`], [`ingest_reader`] and [`ingest_file`] run the loop
//!
//! ```text
//! read window -> resolve boundaries -> parse batch -> upsert rows -> repeat
//! ```
//!
//! until end-of-stream, then settle the unterminated tail according to
//! [`TruncatedTailPolicy`]. The byte source is owned by the
//! [`ChunkReader`] and dropped on every exit path.

use crate::boundary::{BoundaryResolver, Record};
use crate::cancel::CancellationToken;
use crate::config::{EmptyRecordPolicy, IngestConfig, ParseFailurePolicy, TruncatedTailPolicy};
use crate::error::{IngestError, ParseFailureReason, RecordParseError, Result};
use crate::io::ChunkReader;
use crate::io::compression::auto_detect_reader;
use crate::metrics::IngestMetrics;
use crate::output::render_pretty;
use crate::registry::Registry;
use crate::rejects::RejectLog;
use crate::row::{CsvRowParser, RowParser, UserRecord};
use anyhow::Context;
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

/// Batches smaller than this are parsed inline even when parallel parsing is on.
const PARALLEL_MIN_BATCH: usize = 64;

type ParseResult<T> = std::result::Result<T, ParseFailureReason>;

/// Everything a finished run produced.
#[derive(Debug)]
pub struct IngestReport<T> {
    pub registry: Registry<T>,
    pub rejects: RejectLog,
    pub metrics: IngestMetrics,
}

impl<T: Serialize> IngestReport<T> {
    /// Render the registry as the pretty-printed JSON document.
    ///
    /// # Errors
    /// Returns [`IngestError::Serialization`] if a row cannot be serialized.
    pub fn render(&self) -> Result<String> {
        render_pretty(&self.registry)
    }
}

/// State of one ingestion run.
pub struct IngestSession<P: RowParser> {
    config: IngestConfig,
    parser: P,
    resolver: BoundaryResolver,
    registry: Registry<P::Row>,
    rejects: RejectLog,
    metrics: IngestMetrics,
    started: Instant,
}

impl<P: RowParser> IngestSession<P> {
    /// Start a session.
    ///
    /// # Errors
    /// Returns [`IngestError::InvalidConfig`] if `config` does not validate.
    pub fn new(config: IngestConfig, parser: P) -> Result<Self> {
        config.validate()?;
        let resolver = BoundaryResolver::new(config.delimiter_byte())
            .with_max_record_len(config.max_record_len);
        Ok(Self {
            config,
            parser,
            resolver,
            registry: Registry::new(),
            rejects: RejectLog::new(),
            metrics: IngestMetrics::default(),
            started: Instant::now(),
        })
    }

    /// The registry as built so far.
    pub fn registry(&self) -> &Registry<P::Row> {
        &self.registry
    }

    pub fn metrics(&self) -> &IngestMetrics {
        &self.metrics
    }

    /// Feed one window that starts at stream offset `offset`.
    ///
    /// # Errors
    /// Fails on an oversized record, or on a bad record under
    /// [`ParseFailurePolicy::FailFast`].
    pub fn feed(&mut self, window: &[u8], offset: u64) -> Result<()> {
        if window.is_empty() {
            return Ok(());
        }
        self.metrics.windows_read += 1;
        self.metrics.bytes_read += window.len() as u64;

        let records = self.resolver.resolve(window, offset)?;
        self.metrics.observe_fragment(self.resolver.fragment().len());
        self.process(records)
    }

    /// Settle the tail and hand back the results.
    ///
    /// # Errors
    /// Returns [`IngestError::TruncatedTail`] when the stream ended inside a
    /// record under [`TruncatedTailPolicy::Error`], or a parse failure from the
    /// accepted tail under [`ParseFailurePolicy::FailFast`].
    pub fn finish(mut self) -> Result<IngestReport<P::Row>> {
        if let Some(offset) = self.resolver.fragment_offset() {
            let len = self.resolver.fragment().len();
            match self.config.truncated_tail {
                TruncatedTailPolicy::Error => {
                    return Err(IngestError::TruncatedTail { offset, len });
                }
                TruncatedTailPolicy::Accept => {
                    log::debug!("accepting {len} unterminated bytes at {offset} as a record");
                    self.metrics.tail_accepted = true;
                    let tail: Vec<Record> = self.resolver.finish().into_iter().collect();
                    self.process(tail)?;
                }
            }
        }

        self.metrics.record_elapsed(self.started.elapsed());
        log::info!(
            "ingested {} records into {} keys ({} rejected, {} replaced)",
            self.metrics.records_resolved,
            self.registry.len(),
            self.metrics.records_rejected,
            self.metrics.keys_replaced
        );
        Ok(IngestReport {
            registry: self.registry,
            rejects: self.rejects,
            metrics: self.metrics,
        })
    }

    fn process(&mut self, records: Vec<Record>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        self.metrics.records_resolved += records.len() as u64;

        let trim_cr = self.config.trims_carriage_return();
        let mut batch = Vec::with_capacity(records.len());
        for mut record in records {
            if trim_cr && record.bytes.last() == Some(&b'\r') {
                record.bytes.pop();
            }
            if record.bytes.is_empty() && self.config.empty_records == EmptyRecordPolicy::Skip {
                log::debug!(
                    "skipping empty record #{} at byte {}",
                    record.index,
                    record.offset
                );
                self.metrics.empty_records_skipped += 1;
                continue;
            }
            batch.push(record);
        }
        log::debug!("parsing batch of {} records", batch.len());

        let results = self.parse_batch(&batch);
        for (record, result) in batch.iter().zip(results) {
            match result {
                Ok(row) => {
                    if self.registry.upsert_row(row).is_some() {
                        self.metrics.keys_replaced += 1;
                    }
                    self.metrics.rows_upserted += 1;
                }
                Err(reason) => self.reject(record, reason)?,
            }
        }
        Ok(())
    }

    /// Parse every record of a batch; results line up with `batch`.
    fn parse_batch(&self, batch: &[Record]) -> Vec<ParseResult<P::Row>> {
        if self.config.parallel_parse && batch.len() >= PARALLEL_MIN_BATCH {
            return parse_parallel(&self.parser, batch);
        }
        batch.iter().map(|r| parse_one(&self.parser, r)).collect()
    }

    fn reject(&mut self, record: &Record, reason: ParseFailureReason) -> Result<()> {
        let err = RecordParseError {
            index: record.index,
            offset: record.offset,
            raw: record.lossy(),
            reason,
        };
        match self.config.on_parse_error {
            ParseFailurePolicy::FailFast => Err(err.into()),
            ParseFailurePolicy::SkipAndLog => {
                log::warn!("skipping {err}");
                self.metrics.records_rejected += 1;
                self.rejects.push(err);
                Ok(())
            }
        }
    }
}

fn parse_one<P: RowParser>(parser: &P, record: &Record) -> ParseResult<P::Row> {
    if record.bytes.is_empty() {
        return Err(ParseFailureReason::Empty);
    }
    parser.parse(record)
}

#[cfg(feature = "parallel-parse")]
fn parse_parallel<P: RowParser>(parser: &P, batch: &[Record]) -> Vec<ParseResult<P::Row>> {
    use rayon::prelude::*;
    // Indexed collect keeps results in record order.
    batch.par_iter().map(|r| parse_one(parser, r)).collect()
}

#[cfg(not(feature = "parallel-parse"))]
fn parse_parallel<P: RowParser>(parser: &P, batch: &[Record]) -> Vec<ParseResult<P::Row>> {
    batch.iter().map(|r| parse_one(parser, r)).collect()
}

/// Run a full ingestion over `reader` with a custom row parser.
///
/// `cancel` is checked before every window read.
///
/// # Errors
/// Any [`IngestError`]; no partial registry is returned on failure.
pub fn ingest<R, P>(
    reader: R,
    parser: P,
    config: &IngestConfig,
    cancel: &CancellationToken,
) -> Result<IngestReport<P::Row>>
where
    R: Read,
    P: RowParser,
{
    let mut session = IngestSession::new(config.clone(), parser)?;
    let mut chunks = ChunkReader::new(reader, config.window_size);
    loop {
        if cancel.is_cancelled() {
            log::warn!("ingestion cancelled after {} bytes", chunks.position());
            return Err(IngestError::Cancelled {
                offset: chunks.position(),
            });
        }
        let window = chunks.read()?;
        session.feed(window.bytes, window.offset)?;
        if window.is_end {
            break;
        }
    }
    session.finish()
}

/// Ingest user records from `reader` with the default CSV parser.
///
/// # Errors
/// Any [`IngestError`].
pub fn ingest_reader<R: Read>(
    reader: R,
    config: &IngestConfig,
) -> Result<IngestReport<UserRecord>> {
    ingest(
        reader,
        CsvRowParser::from_config(config),
        config,
        &CancellationToken::new(),
    )
}

/// Ingest user records from a file, decompressing it transparently if needed.
///
/// # Errors
/// Returns an error if the file cannot be opened, or wraps the
/// [`IngestError`] that ended the run.
pub fn ingest_file(
    path: impl AsRef<Path>,
    config: &IngestConfig,
) -> anyhow::Result<IngestReport<UserRecord>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let rdr = auto_detect_reader(f, path)
        .with_context(|| format!("setup decompression for {}", path.display()))?;
    let report =
        ingest_reader(rdr, config).with_context(|| format!("ingest {}", path.display()))?;
    Ok(report)
}
