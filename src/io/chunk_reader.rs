//! Fixed-size window reads over any [`Read`] source.

use crate::error::{IngestError, Result};
use std::io::{ErrorKind, Read};

/// One window pulled from the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window<'a> {
    /// Up to `window_size` bytes; shorter only when the stream ended.
    pub bytes: &'a [u8],
    /// Stream offset of `bytes[0]`.
    pub offset: u64,
    /// The stream is exhausted; later reads return no bytes.
    pub is_end: bool,
}

/// Pulls fixed-size windows from an underlying byte source.
///
/// A window is filled completely unless end-of-stream intervenes, so window
/// boundaries depend only on the window size, not on how the source happens
/// to split its reads. The source is owned and dropped with the reader.
pub struct ChunkReader<R> {
    inner: R,
    buf: Vec<u8>,
    position: u64,
    finished: bool,
}

impl<R: Read> ChunkReader<R> {
    /// Wrap `inner`, reading `window_size` bytes at a time (clamped to at least 1).
    pub fn new(inner: R, window_size: usize) -> Self {
        Self {
            inner,
            buf: vec![0; window_size.max(1)],
            position: 0,
            finished: false,
        }
    }

    /// Bytes consumed from the source so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read the next window.
    ///
    /// # Errors
    /// Returns [`IngestError::StreamRead`] if the source fails. Interrupted reads
    /// are retried; nothing else is.
    pub fn read(&mut self) -> Result<Window<'_>> {
        let offset = self.position;
        if self.finished {
            return Ok(Window {
                bytes: &[],
                offset,
                is_end: true,
            });
        }

        let mut filled = 0;
        while filled < self.buf.len() {
            match self.inner.read(&mut self.buf[filled..]) {
                Ok(0) => {
                    self.finished = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(source) => {
                    return Err(IngestError::StreamRead {
                        offset: offset + filled as u64,
                        source,
                    });
                }
            }
        }

        self.position += filled as u64;
        Ok(Window {
            bytes: &self.buf[..filled],
            offset,
            is_end: self.finished,
        })
    }
}
