//! Turning complete records into typed rows.
//!
//! [`RowParser`] is the seam between boundary reconstruction and the registry.
//! The default implementation, [`CsvRowParser`], splits a record with the
//! `csv` crate and deserializes the fields into any Serde row type, so a
//! different record layout only needs a new struct.

use crate::boundary::Record;
use crate::config::IngestConfig;
use crate::error::ParseFailureReason;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// A row that can be stored in a [`Registry`](crate::registry::Registry).
pub trait Keyed {
    /// The primary key; rows with equal keys replace each other.
    fn key(&self) -> &str;
}

/// The default row: a user entry keyed by user name.
///
/// Serialized with the attribute names of the output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub user_name: String,
    pub first_name: String,
    pub second_name: String,
    pub email: String,
}

impl Keyed for UserRecord {
    fn key(&self) -> &str {
        &self.user_name
    }
}

/// Parses one complete record (delimiter already stripped) into a row.
///
/// Parsers must be shareable across threads because batches may be parsed on
/// the rayon pool.
pub trait RowParser: Send + Sync {
    type Row: Keyed + Send;

    /// Parse a single record.
    ///
    /// # Errors
    /// Returns the reason the record cannot become a row.
    fn parse(&self, record: &Record) -> Result<Self::Row, ParseFailureReason>;
}

/// CSV-backed parser for fixed-arity records.
///
/// Quoting follows the `csv` crate's defaults (double quotes, doubled to
/// escape). The record delimiter is the only terminator, so a bare `\n` inside
/// a `;`-delimited record is ordinary field data.
pub struct CsvRowParser<T> {
    builder: csv::ReaderBuilder,
    field_count: usize,
    _row: PhantomData<fn() -> T>,
}

impl<T> CsvRowParser<T> {
    pub fn new(separator: u8, delimiter: u8, field_count: usize) -> Self {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(separator)
            .terminator(csv::Terminator::Any(delimiter))
            .buffer_capacity(1024);
        Self {
            builder,
            field_count,
            _row: PhantomData,
        }
    }

    /// Build a parser from the separator, delimiter and field count of `config`.
    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(
            config.separator_byte(),
            config.delimiter_byte(),
            config.field_count,
        )
    }
}

impl<T> RowParser for CsvRowParser<T>
where
    T: DeserializeOwned + Keyed + Send,
{
    type Row = T;

    fn parse(&self, record: &Record) -> Result<T, ParseFailureReason> {
        if record.bytes.is_empty() {
            return Err(ParseFailureReason::Empty);
        }
        let mut rdr = self.builder.from_reader(record.bytes.as_slice());
        let mut fields = csv::StringRecord::new();
        match rdr.read_record(&mut fields) {
            Ok(true) => {}
            Ok(false) => return Err(ParseFailureReason::Empty),
            Err(e) => {
                return Err(ParseFailureReason::Malformed {
                    message: e.to_string(),
                });
            }
        }
        if fields.len() != self.field_count {
            return Err(ParseFailureReason::FieldCount {
                expected: self.field_count,
                found: fields.len(),
            });
        }
        fields
            .deserialize::<T>(None)
            .map_err(|e| ParseFailureReason::Malformed {
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(bytes: &[u8]) -> Record {
        Record {
            index: 0,
            offset: 0,
            bytes: bytes.to_vec(),
        }
    }

    fn parser() -> CsvRowParser<UserRecord> {
        CsvRowParser::from_config(&IngestConfig::default())
    }

    #[test]
    fn parses_four_fields_into_a_user() {
        let row = parser().parse(&record(b"alice,Alice,Smith,a@x.com")).unwrap();
        assert_eq!(row.key(), "alice");
        assert_eq!(row.first_name, "Alice");
        assert_eq!(row.second_name, "Smith");
        assert_eq!(row.email, "a@x.com");
    }

    #[test]
    fn quoted_field_may_contain_the_separator() {
        let row = parser()
            .parse(&record(br#"bob,"Bob, Jr.",Jones,b@x.com"#))
            .unwrap();
        assert_eq!(row.first_name, "Bob, Jr.");
    }

    #[test]
    fn wrong_arity_is_reported() {
        let err = parser().parse(&record(b"carol,Carol,c@x.com")).unwrap_err();
        assert_eq!(
            err,
            ParseFailureReason::FieldCount {
                expected: 4,
                found: 3
            }
        );
    }

    #[test]
    fn empty_record_is_rejected() {
        assert_eq!(
            parser().parse(&record(b"")).unwrap_err(),
            ParseFailureReason::Empty
        );
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        let err = parser().parse(&record(b"d,\xff\xfe,x,y")).unwrap_err();
        assert!(matches!(err, ParseFailureReason::Malformed { .. }));
    }
}
