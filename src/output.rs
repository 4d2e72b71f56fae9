//! Rendering the registry as the output document.
//!
//! The document is a JSON object mapping each primary key to its row,
//! pretty-printed with two-space indentation and keys in sorted order. It is
//! rendered completely in memory before anything is written, so a failure
//! never leaves half a document behind.

use crate::error::Result;
use crate::registry::Registry;
use anyhow::Context;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// Render `registry` as a pretty-printed JSON object.
///
/// # Errors
/// Returns [`IngestError::Serialization`](crate::error::IngestError::Serialization)
/// if a row cannot be serialized.
pub fn render_pretty<T: Serialize>(registry: &Registry<T>) -> Result<String> {
    let doc: BTreeMap<&str, &T> = registry.snapshot().into_iter().collect();
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Render `registry` and write it, newline-terminated, to `out`.
///
/// # Errors
/// Returns an error if rendering fails or `out` cannot be written.
pub fn write_document<T: Serialize, W: Write>(
    registry: &Registry<T>,
    mut out: W,
) -> anyhow::Result<()> {
    let doc = render_pretty(registry)?;
    out.write_all(doc.as_bytes())
        .and_then(|()| out.write_all(b"\n"))
        .and_then(|()| out.flush())
        .context("write document")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::UserRecord;

    fn user(name: &str, email: &str) -> UserRecord {
        UserRecord {
            user_name: name.into(),
            first_name: "F".into(),
            second_name: "S".into(),
            email: email.into(),
        }
    }

    #[test]
    fn two_space_indent_and_attribute_names() {
        let mut reg = Registry::new();
        reg.upsert_row(user("bob", "b@x.com"));
        let doc = render_pretty(&reg).unwrap();
        let expected = r#"{
  "bob": {
    "userName": "bob",
    "firstName": "F",
    "secondName": "S",
    "email": "b@x.com"
  }
}"#;
        assert_eq!(doc, expected);
    }

    #[test]
    fn empty_registry_is_an_empty_object() {
        let reg: Registry<UserRecord> = Registry::new();
        assert_eq!(render_pretty(&reg).unwrap(), "{}");
    }

    #[test]
    fn written_document_ends_with_newline() {
        let mut reg = Registry::new();
        reg.upsert_row(user("a", "a@x.com"));
        let mut buf = Vec::new();
        write_document(&reg, &mut buf).unwrap();
        assert!(buf.ends_with(b"}\n"));
    }
}
