//! Record boundary reconstruction across window reads.
//!
//! Windows are cut at fixed byte counts, so a record can start in one window
//! and end several windows later. [`BoundaryResolver`] owns the carried
//! fragment and turns each window into the complete records it finishes.
//!
//! For every window `W` and carried fragment `F`:
//! 1. If `F` is non-empty, the first delimiter in `W` completes `F`. Without a
//!    delimiter, all of `W` is appended to `F` and nothing is emitted.
//! 2. Everything up to the *last* delimiter of what remains is a run of
//!    complete records, emitted as one batch in stream order.
//! 3. Bytes after the last delimiter become the new `F`.
//!
//! Every byte of the stream ends up in exactly one record (delimiters
//! excluded), and records come out in order, never split and never repeated,
//! whatever the window size.

use crate::error::{IngestError, Result};

/// One complete record, delimiter stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 0-based position of the record in the stream.
    pub index: u64,
    /// Stream offset of the record's first byte.
    pub offset: u64,
    pub bytes: Vec<u8>,
}

impl Record {
    /// The record's bytes as text, with invalid UTF-8 replaced.
    #[must_use]
    pub fn lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Carries the unterminated fragment from window to window.
#[derive(Debug, Clone)]
pub struct BoundaryResolver {
    delimiter: u8,
    fragment: Vec<u8>,
    fragment_offset: u64,
    next_index: u64,
    max_record_len: Option<usize>,
}

impl BoundaryResolver {
    pub fn new(delimiter: u8) -> Self {
        Self {
            delimiter,
            fragment: Vec::new(),
            fragment_offset: 0,
            next_index: 0,
            max_record_len: None,
        }
    }

    /// Fail once a record grows past `limit` bytes instead of buffering it.
    #[must_use]
    pub fn with_max_record_len(mut self, limit: Option<usize>) -> Self {
        self.max_record_len = limit;
        self
    }

    /// Bytes carried over from previous windows.
    pub fn fragment(&self) -> &[u8] {
        &self.fragment
    }

    /// Number of records emitted so far.
    pub fn records_emitted(&self) -> u64 {
        self.next_index
    }

    /// Resolve one window starting at stream offset `offset`.
    ///
    /// Returns the records the window completes, possibly none.
    ///
    /// # Errors
    /// Returns [`IngestError::RecordTooLong`] if a record under assembly exceeds
    /// the configured limit.
    pub fn resolve(&mut self, window: &[u8], offset: u64) -> Result<Vec<Record>> {
        let delimiter = self.delimiter;
        let mut records = Vec::new();
        let mut rest = window;
        let mut rest_offset = offset;

        if !self.fragment.is_empty() {
            let Some(i) = rest.iter().position(|&b| b == delimiter) else {
                self.fragment.extend_from_slice(rest);
                self.check_fragment()?;
                return Ok(records);
            };
            self.fragment.extend_from_slice(&rest[..i]);
            self.check_fragment()?;
            let bytes = std::mem::take(&mut self.fragment);
            let start = self.fragment_offset;
            records.push(self.emit(start, bytes));
            rest = &rest[i + 1..];
            rest_offset += (i + 1) as u64;
        }

        let tail = match rest.iter().rposition(|&b| b == delimiter) {
            Some(j) => {
                let mut cursor = rest_offset;
                for piece in rest[..j].split(|&b| b == delimiter) {
                    self.check_len(cursor, piece.len())?;
                    records.push(self.emit(cursor, piece.to_vec()));
                    cursor += piece.len() as u64 + 1;
                }
                &rest[j + 1..]
            }
            None => rest,
        };

        if !tail.is_empty() {
            self.fragment_offset = offset + (window.len() - tail.len()) as u64;
            self.fragment.extend_from_slice(tail);
            self.check_fragment()?;
        }
        Ok(records)
    }

    /// Take whatever is still carried at end-of-stream as a final record.
    ///
    /// Returns `None` when the stream ended on a delimiter. Whether the
    /// returned record is legitimate is the caller's decision.
    pub fn finish(&mut self) -> Option<Record> {
        if self.fragment.is_empty() {
            return None;
        }
        let bytes = std::mem::take(&mut self.fragment);
        let start = self.fragment_offset;
        Some(self.emit(start, bytes))
    }

    /// Stream offset of the carried fragment, if any.
    pub fn fragment_offset(&self) -> Option<u64> {
        (!self.fragment.is_empty()).then_some(self.fragment_offset)
    }

    fn emit(&mut self, offset: u64, bytes: Vec<u8>) -> Record {
        let index = self.next_index;
        self.next_index += 1;
        Record {
            index,
            offset,
            bytes,
        }
    }

    fn check_fragment(&self) -> Result<()> {
        self.check_len(self.fragment_offset, self.fragment.len())
    }

    fn check_len(&self, offset: u64, len: usize) -> Result<()> {
        match self.max_record_len {
            Some(limit) if len > limit => Err(IngestError::RecordTooLong { offset, limit }),
            _ => Ok(()),
        }
    }
}
