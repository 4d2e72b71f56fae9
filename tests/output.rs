//! The rendered JSON document.

use anyhow::Result;
use chunkfold::output::{render_pretty, write_document};
use chunkfold::testing::*;
use chunkfold::{IngestConfig, Registry, UserRecord, ingest_reader};
use std::collections::HashMap;

#[test]
fn document_reads_back_as_the_registry() -> Result<()> {
    let input = format!("{}user0002,Second,Pass,late@example.com\n", users_csv(5));
    let report = ingest_reader(input.as_bytes(), &IngestConfig::default().with_window_size(17))?;
    let doc = report.render()?;

    let parsed: HashMap<String, UserRecord> = serde_json::from_str(&doc)?;
    assert_eq!(parsed.len(), 5);
    for (key, row) in report.registry.snapshot() {
        assert_eq!(parsed.get(key), Some(row));
    }
    assert_eq!(parsed["user0002"].email, "late@example.com");
    Ok(())
}

#[test]
fn document_layout() -> Result<()> {
    let report = ingest_reader(
        &b"bob,Bob,Jones,b@x.com\nalice,Alice,Smith,a@x.com\n"[..],
        &IngestConfig::default(),
    )?;
    let expected = r#"{
  "alice": {
    "userName": "alice",
    "firstName": "Alice",
    "secondName": "Smith",
    "email": "a@x.com"
  },
  "bob": {
    "userName": "bob",
    "firstName": "Bob",
    "secondName": "Jones",
    "email": "b@x.com"
  }
}"#;
    assert_eq!(report.render()?, expected);
    Ok(())
}

#[test]
fn quoted_separator_survives_into_the_document() -> Result<()> {
    let report = ingest_reader(
        &b"carol,\"Carol, Jr.\",King,c@x.com\n"[..],
        &IngestConfig::default().with_window_size(4),
    )?;
    let parsed: HashMap<String, UserRecord> = serde_json::from_str(&report.render()?)?;
    assert_eq!(parsed["carol"].first_name, "Carol, Jr.");
    Ok(())
}

#[test]
fn written_document_ends_with_newline() -> Result<()> {
    let mut registry = Registry::new();
    registry.upsert_row(UserRecord {
        user_name: "z".into(),
        first_name: "Z".into(),
        second_name: "Zed".into(),
        email: "z@x.com".into(),
    });
    let mut out = Vec::new();
    write_document(&registry, &mut out)?;
    let text = String::from_utf8(out)?;
    assert_eq!(text, format!("{}\n", render_pretty(&registry)?));
    Ok(())
}
