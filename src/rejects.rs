//! Collection of records skipped under
//! [`ParseFailurePolicy::SkipAndLog`](crate::config::ParseFailurePolicy::SkipAndLog).
//!
//! Skipped records are kept rather than dropped so a run can report exactly
//! what it ignored, either on stderr or as a JSON file next to the output.

use crate::error::RecordParseError;
use std::io;
use std::path::Path;

/// Records that failed to parse, in stream order.
#[derive(Debug, Clone, Default)]
pub struct RejectLog {
    rejects: Vec<RecordParseError>,
}

impl RejectLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, reject: RecordParseError) {
        self.rejects.push(reject);
    }

    pub fn len(&self) -> usize {
        self.rejects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rejects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordParseError> {
        self.rejects.iter()
    }

    /// Print one line per reject to stderr.
    pub fn print(&self) {
        for reject in &self.rejects {
            eprintln!("rejected {reject}");
        }
    }

    /// Export rejects as a pretty-printed JSON array.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.rejects)
    }

    /// Write rejects to `path` as JSON.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let json = self.to_json().map_err(io::Error::other)?;
        std::fs::write(path, json)
    }
}
