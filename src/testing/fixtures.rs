//! Generated inputs and boundary-stage helpers.

use crate::boundary::{BoundaryResolver, Record};
use crate::error::Result;
use crate::io::ChunkReader;

/// The CSV line (no delimiter) for generated user `i`.
#[must_use]
pub fn user_line(i: usize) -> String {
    format!("user{i:04},First{i},Last{i},user{i}@example.com")
}

/// `n` newline-terminated user lines with distinct keys.
#[must_use]
pub fn users_csv(n: usize) -> String {
    (0..n).map(|i| user_line(i) + "\n").collect()
}

/// Output of [`resolve_records`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStream {
    /// Complete records in stream order.
    pub records: Vec<Record>,
    /// Bytes left unterminated at end-of-stream.
    pub tail: Option<Record>,
}

impl ResolvedStream {
    /// Record bodies as lossy strings.
    #[must_use]
    pub fn bodies(&self) -> Vec<String> {
        self.records.iter().map(Record::lossy).collect()
    }
}

/// Run only the window read and boundary stages over `input`.
///
/// # Errors
/// Propagates errors from the boundary resolver.
pub fn resolve_records(
    input: &[u8],
    window_size: usize,
    delimiter: u8,
) -> Result<ResolvedStream> {
    let mut chunks = ChunkReader::new(input, window_size);
    let mut resolver = BoundaryResolver::new(delimiter);
    let mut records = Vec::new();
    loop {
        let window = chunks.read()?;
        records.extend(resolver.resolve(window.bytes, window.offset)?);
        if window.is_end {
            break;
        }
    }
    Ok(ResolvedStream {
        records,
        tail: resolver.finish(),
    })
}
