//! File-based ingestion, configuration files and compressed input.

use anyhow::Result;
use chunkfold::testing::*;
use chunkfold::{IngestConfig, IngestError, TruncatedTailPolicy, ingest_file};
use std::io::Write;

#[test]
fn ingest_plain_file() -> Result<()> {
    let input = mock_input_file(users_csv(25).as_bytes())?;
    let report = ingest_file(input.path(), &IngestConfig::default())?;
    assert_eq!(report.registry.len(), 25);
    assert_eq!(report.metrics.bytes_read, users_csv(25).len() as u64);
    Ok(())
}

#[test]
fn missing_file_names_the_path() {
    let err = ingest_file("/definitely/not/here.csv", &IngestConfig::default()).unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("open /definitely/not/here.csv"), "{msg}");
}

#[test]
fn ingestion_errors_carry_file_context() -> Result<()> {
    let input = mock_input_file(b"a,b,c,d\ne,f")?;
    let err = ingest_file(input.path(), &IngestConfig::default()).unwrap_err();
    assert!(format!("{err:#}").contains("ingest "));
    assert!(matches!(
        err.downcast_ref::<IngestError>(),
        Some(IngestError::TruncatedTail { offset: 8, len: 3 })
    ));
    Ok(())
}

#[test]
fn config_from_json_file() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"{{ "window_size": 7, "delimiter": ";", "truncated_tail": "accept" }}"#
    )?;
    let cfg = IngestConfig::from_json_file(file.path())?;
    assert_eq!(cfg.window_size, 7);
    assert_eq!(cfg.delimiter, ';');
    assert_eq!(cfg.separator, ',');
    assert_eq!(cfg.truncated_tail, TruncatedTailPolicy::Accept);

    let input = mock_input_file(b"a,b,c,d;e,f,g,h")?;
    let report = ingest_file(input.path(), &cfg)?;
    assert_eq!(report.registry.len(), 2);
    Ok(())
}

#[test]
fn invalid_config_file_is_refused() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(file, r#"{{ "window_size": 0 }}"#)?;
    assert!(IngestConfig::from_json_file(file.path()).is_err());
    Ok(())
}

#[cfg(feature = "compression-gzip")]
mod gzip {
    use super::*;

    #[test]
    fn detected_by_extension() -> Result<()> {
        let input = mock_gzip_file(users_csv(60).as_bytes(), "csv.gz")?;
        let report = ingest_file(input.path(), &IngestConfig::default().with_window_size(33))?;
        assert_eq!(report.registry.len(), 60);
        Ok(())
    }

    #[test]
    fn detected_by_magic_bytes() -> Result<()> {
        let input = mock_gzip_file(users_csv(8).as_bytes(), "dat")?;
        let report = ingest_file(input.path(), &IngestConfig::default())?;
        assert_eq!(report.registry.len(), 8);
        assert!(report.registry.get("user0007").is_some());
        Ok(())
    }
}
