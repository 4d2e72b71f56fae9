//! Counters describing one ingestion run.
//!
//! [`IngestMetrics`] is filled in by the session as windows are read and
//! records are folded into the registry. It can be printed in a
//! human-readable block, logged, or exported as JSON alongside the output
//! document.
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! let report = chunkfold::ingest_file("users.csv", &chunkfold::IngestConfig::default())?;
//! report.metrics.print();
//! report.metrics.save_to_file("metrics.json")?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestMetrics {
    /// Window reads that returned at least one byte.
    pub windows_read: u64,
    pub bytes_read: u64,
    /// Complete records handed out by the boundary resolver.
    pub records_resolved: u64,
    pub rows_upserted: u64,
    /// Upserts that replaced an existing key.
    pub keys_replaced: u64,
    pub empty_records_skipped: u64,
    pub records_rejected: u64,
    /// The unterminated tail was parsed as a final record.
    pub tail_accepted: bool,
    /// Longest fragment carried between windows, in bytes.
    pub max_fragment_len: u64,
    pub elapsed_ms: u64,
}

impl IngestMetrics {
    pub(crate) fn record_elapsed(&mut self, elapsed: Duration) {
        self.elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    }

    pub(crate) fn observe_fragment(&mut self, len: usize) {
        self.max_fragment_len = self.max_fragment_len.max(len as u64);
    }

    /// All counters as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Print the counters to stderr, leaving stdout to the document.
    pub fn print(&self) {
        eprintln!("\n========== Ingestion Metrics ==========");
        eprintln!(
            "Execution Time: {:.3}s ({} ms)",
            self.elapsed_ms as f64 / 1000.0,
            self.elapsed_ms
        );
        eprintln!("---------------------------------------");
        eprintln!("windows_read: {}", self.windows_read);
        eprintln!("bytes_read: {}", self.bytes_read);
        eprintln!("records_resolved: {}", self.records_resolved);
        eprintln!("rows_upserted: {}", self.rows_upserted);
        eprintln!("keys_replaced: {}", self.keys_replaced);
        eprintln!("empty_records_skipped: {}", self.empty_records_skipped);
        eprintln!("records_rejected: {}", self.records_rejected);
        eprintln!("tail_accepted: {}", self.tail_accepted);
        eprintln!("max_fragment_len: {}", self.max_fragment_len);
        eprintln!("=======================================\n");
    }

    /// Save the counters to a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let formatted = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        file.write_all(formatted.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_high_water_mark() {
        let mut m = IngestMetrics::default();
        m.observe_fragment(3);
        m.observe_fragment(9);
        m.observe_fragment(2);
        assert_eq!(m.max_fragment_len, 9);
    }

    #[test]
    fn json_carries_every_counter() {
        let m = IngestMetrics {
            windows_read: 2,
            rows_upserted: 5,
            ..Default::default()
        };
        let v = m.to_json();
        assert_eq!(v["windows_read"], 2);
        assert_eq!(v["rows_upserted"], 5);
        assert_eq!(v["tail_accepted"], false);
    }
}
