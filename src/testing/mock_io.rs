//! Mock byte sources and temporary input files.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A reader that never returns more than `max_per_read` bytes per call.
///
/// Models sockets and pipes, which routinely hand back partial reads.
pub struct TrickleReader {
    data: Vec<u8>,
    pos: usize,
    max_per_read: usize,
}

impl TrickleReader {
    pub fn new(data: Vec<u8>, max_per_read: usize) -> Self {
        Self {
            data,
            pos: 0,
            max_per_read: max_per_read.max(1),
        }
    }
}

impl Read for TrickleReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf
            .len()
            .min(self.max_per_read)
            .min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// A reader that yields `data` up to byte `fail_at`, then fails every call.
pub struct FailingReader {
    data: Vec<u8>,
    pos: usize,
    fail_at: usize,
}

impl FailingReader {
    pub fn new(data: Vec<u8>, fail_at: usize) -> Self {
        Self {
            data,
            pos: 0,
            fail_at,
        }
    }
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.fail_at {
            return Err(io::Error::other("injected read failure"));
        }
        let end = self.fail_at.min(self.data.len());
        let n = buf.len().min(end.saturating_sub(self.pos));
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// A reader that reports `Interrupted` before every successful read.
pub struct InterruptingReader<R> {
    inner: R,
    interrupt_next: bool,
}

impl<R> InterruptingReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            interrupt_next: true,
        }
    }
}

impl<R: Read> Read for InterruptingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.interrupt_next {
            self.interrupt_next = false;
            return Err(io::ErrorKind::Interrupted.into());
        }
        self.interrupt_next = true;
        self.inner.read(buf)
    }
}

/// A temporary file that is deleted when dropped.
pub struct TempFilePath {
    #[allow(dead_code)]
    temp_file: NamedTempFile,
    path: PathBuf,
}

impl TempFilePath {
    /// Create an empty temporary file whose name ends in `.{extension}`.
    ///
    /// # Errors
    /// Returns an error if the temporary file cannot be created.
    pub fn with_extension(extension: &str) -> io::Result<Self> {
        let temp_file = tempfile::Builder::new()
            .suffix(&format!(".{extension}"))
            .tempfile()?;
        let path = temp_file.path().to_path_buf();
        Ok(Self { temp_file, path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Write `contents` to a temporary `.csv` file.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn mock_input_file(contents: &[u8]) -> io::Result<TempFilePath> {
    let temp = TempFilePath::with_extension("csv")?;
    std::fs::write(temp.path(), contents)?;
    Ok(temp)
}

/// Gzip `contents` into a temporary file named with `extension`.
///
/// Pass `"csv.gz"` to exercise extension detection, or something neutral like
/// `"dat"` to force detection by magic bytes.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
#[cfg(feature = "compression-gzip")]
pub fn mock_gzip_file(contents: &[u8], extension: &str) -> io::Result<TempFilePath> {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    let temp = TempFilePath::with_extension(extension)?;
    let file = std::fs::File::create(temp.path())?;
    let mut enc = GzEncoder::new(file, Compression::default());
    enc.write_all(contents)?;
    enc.finish()?.flush()?;
    Ok(temp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trickle_reader_caps_each_read() {
        let mut r = TrickleReader::new(b"abcdef".to_vec(), 4);
        let mut buf = [0u8; 10];
        assert_eq!(r.read(&mut buf).unwrap(), 4);
        assert_eq!(r.read(&mut buf).unwrap(), 2);
        assert_eq!(r.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn failing_reader_stops_at_the_configured_byte() {
        let mut r = FailingReader::new(b"abcdef".to_vec(), 3);
        let mut buf = [0u8; 10];
        assert_eq!(r.read(&mut buf).unwrap(), 3);
        assert!(r.read(&mut buf).is_err());
    }

    #[test]
    fn mock_file_round_trips_bytes() {
        let f = mock_input_file(b"a,b,c,d\n").unwrap();
        assert_eq!(std::fs::read(f.path()).unwrap(), b"a,b,c,d\n");
    }
}
