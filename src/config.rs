//! Ingestion configuration.
//!
//! [`IngestConfig`] gathers every knob the ingestion loop reads: window size,
//! record delimiter, field layout, and the policies for the three ambiguous
//! situations (empty records, malformed records, an unterminated tail).
//!
//! The struct is `serde`-enabled so it can be loaded from a JSON file; all
//! fields are optional there and fall back to [`IngestConfig::default`].
//!
//! ```
//! use chunkfold::config::{IngestConfig, TruncatedTailPolicy};
//!
//! let cfg = IngestConfig::default()
//!     .with_window_size(4096)
//!     .with_truncated_tail(TruncatedTailPolicy::Accept);
//! assert!(cfg.validate().is_ok());
//! ```

use crate::error::{IngestError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Bytes pulled from the stream per read.
pub const DEFAULT_WINDOW_SIZE: usize = 100;

/// Key plus three attributes.
pub const DEFAULT_FIELD_COUNT: usize = 4;

/// What to do with a record that has no bytes between delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyRecordPolicy {
    /// Drop it silently (counted in metrics).
    #[default]
    Skip,
    /// Treat it as a parse failure, subject to [`ParseFailurePolicy`].
    Reject,
}

/// What to do with bytes left in the fragment when the stream ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TruncatedTailPolicy {
    /// Fail with [`IngestError::TruncatedTail`].
    #[default]
    Error,
    /// Parse the unterminated bytes as a final record.
    Accept,
}

/// What to do when a record fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParseFailurePolicy {
    /// Abort the run on the first bad record; no registry is produced.
    FailFast,
    /// Log the record, keep it in the reject list and continue.
    #[default]
    SkipAndLog,
}

/// Settings for one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Bytes per window read. Must be at least 1.
    pub window_size: usize,
    /// Record delimiter (ASCII).
    pub delimiter: char,
    /// Field separator inside a record (ASCII).
    pub separator: char,
    /// Number of fields every record must carry.
    pub field_count: usize,
    pub empty_records: EmptyRecordPolicy,
    pub truncated_tail: TruncatedTailPolicy,
    pub on_parse_error: ParseFailurePolicy,
    /// Upper bound for a record still being assembled; `None` means unbounded.
    pub max_record_len: Option<usize>,
    /// Strip one trailing `\r` from each record when the delimiter is `\n`.
    pub trim_carriage_return: bool,
    /// Parse large batches on the rayon pool (feature `parallel-parse`).
    /// Upserts are still applied in record order.
    pub parallel_parse: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            delimiter: '\n',
            separator: ',',
            field_count: DEFAULT_FIELD_COUNT,
            empty_records: EmptyRecordPolicy::default(),
            truncated_tail: TruncatedTailPolicy::default(),
            on_parse_error: ParseFailurePolicy::default(),
            max_record_len: None,
            trim_carriage_return: true,
            parallel_parse: false,
        }
    }
}

impl IngestConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, is not valid JSON, or the
    /// resulting configuration fails [`validate`](Self::validate).
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    #[must_use]
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    #[must_use]
    pub fn with_field_count(mut self, field_count: usize) -> Self {
        self.field_count = field_count;
        self
    }

    #[must_use]
    pub fn with_empty_records(mut self, policy: EmptyRecordPolicy) -> Self {
        self.empty_records = policy;
        self
    }

    #[must_use]
    pub fn with_truncated_tail(mut self, policy: TruncatedTailPolicy) -> Self {
        self.truncated_tail = policy;
        self
    }

    #[must_use]
    pub fn with_parse_failure(mut self, policy: ParseFailurePolicy) -> Self {
        self.on_parse_error = policy;
        self
    }

    #[must_use]
    pub fn with_max_record_len(mut self, limit: Option<usize>) -> Self {
        self.max_record_len = limit;
        self
    }

    #[must_use]
    pub fn with_trim_carriage_return(mut self, trim: bool) -> Self {
        self.trim_carriage_return = trim;
        self
    }

    #[must_use]
    pub fn with_parallel_parse(mut self, parallel: bool) -> Self {
        self.parallel_parse = parallel;
        self
    }

    /// The record delimiter as a byte.
    ///
    /// Only meaningful after [`validate`](Self::validate) has accepted the config.
    #[must_use]
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    /// The field separator as a byte.
    #[must_use]
    pub fn separator_byte(&self) -> u8 {
        self.separator as u8
    }

    /// Check the configuration for values the ingestion loop cannot work with.
    ///
    /// # Errors
    /// Returns [`IngestError::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(invalid("window_size must be at least 1"));
        }
        if !self.delimiter.is_ascii() {
            return Err(invalid(format!(
                "delimiter {:?} is not a single-byte character",
                self.delimiter
            )));
        }
        if !self.separator.is_ascii() {
            return Err(invalid(format!(
                "separator {:?} is not a single-byte character",
                self.separator
            )));
        }
        if self.delimiter == self.separator {
            return Err(invalid("delimiter and separator must differ"));
        }
        if self.separator == '"' {
            return Err(invalid("separator cannot be the quote character"));
        }
        if self.field_count == 0 {
            return Err(invalid("field_count must be at least 1"));
        }
        if self.max_record_len == Some(0) {
            return Err(invalid("max_record_len must be at least 1 when set"));
        }
        Ok(())
    }

    pub(crate) fn trims_carriage_return(&self) -> bool {
        self.trim_carriage_return && self.delimiter == '\n'
    }
}

fn invalid(msg: impl Into<String>) -> IngestError {
    IngestError::InvalidConfig(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behavior() {
        let cfg = IngestConfig::default();
        assert_eq!(cfg.window_size, 100);
        assert_eq!(cfg.delimiter_byte(), b'\n');
        assert_eq!(cfg.separator_byte(), b',');
        assert_eq!(cfg.field_count, 4);
        assert_eq!(cfg.empty_records, EmptyRecordPolicy::Skip);
        assert_eq!(cfg.truncated_tail, TruncatedTailPolicy::Error);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_unusable_values() {
        assert!(IngestConfig::default().with_window_size(0).validate().is_err());
        assert!(IngestConfig::default().with_delimiter(',').validate().is_err());
        assert!(IngestConfig::default().with_delimiter('é').validate().is_err());
        assert!(IngestConfig::default().with_field_count(0).validate().is_err());
        assert!(
            IngestConfig::default()
                .with_max_record_len(Some(0))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: IngestConfig =
            serde_json::from_str(r#"{"window_size": 7, "truncated_tail": "accept"}"#).unwrap();
        assert_eq!(cfg.window_size, 7);
        assert_eq!(cfg.truncated_tail, TruncatedTailPolicy::Accept);
        assert_eq!(cfg.on_parse_error, ParseFailurePolicy::SkipAndLog);
    }

    #[test]
    fn carriage_return_trim_only_applies_to_newline() {
        assert!(IngestConfig::default().trims_carriage_return());
        assert!(!IngestConfig::default().with_delimiter(';').trims_carriage_return());
    }
}
