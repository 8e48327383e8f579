//! NDJSON file parsing for bulk loads.
//!
//! One JSON object per line; blank lines are skipped. The first object
//! fixes the column set: later objects contribute the fields they share
//! with it, missing fields load as NULL. Scalars load as their JSON text,
//! nested values as serialized JSON.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::Value;

use gradebook_core::SafeIdentifier;

use super::{IngestError, Records};

pub(crate) fn read_records(path: &Path) -> Result<Records, IngestError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut column_names: Vec<String> = Vec::new();
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(&line)
            .map_err(|source| IngestError::Json { line: idx + 1, source })?;
        let Value::Object(object) = value else {
            return Err(IngestError::InvalidFormat {
                path: path.to_owned(),
                kind: "NDJSON",
                reason: format!("line {} is not a JSON object", idx + 1),
            });
        };

        if column_names.is_empty() {
            column_names = object.keys().cloned().collect();
        }
        rows.push(
            column_names
                .iter()
                .map(|column| object.get(column).and_then(field_text))
                .collect(),
        );
    }

    let columns = column_names
        .iter()
        .map(|name| SafeIdentifier::new(name, "NDJSON field name"))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Records { columns, rows })
}

fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_ndjson(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".ndjson")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn first_object_fixes_columns() {
        let file = write_ndjson(
            r#"{"id":"r1","score":10}
{"id":"r2","score":null,"extra":"ignored"}

{"id":"r3"}
"#,
        );
        let records = read_records(file.path()).unwrap();

        let columns: Vec<&str> = records.columns.iter().map(|c| c.as_str()).collect();
        assert_eq!(columns, vec!["id", "score"]);
        assert_eq!(records.rows.len(), 3);
        assert_eq!(records.rows[0][1], Some("10".to_owned()));
        assert_eq!(records.rows[1][1], None);
        assert_eq!(records.rows[2], vec![Some("r3".to_owned()), None]);
    }

    #[test]
    fn nested_values_load_as_json_text() {
        let file = write_ndjson(r#"{"id":"r1","tags":["a","b"]}"#);
        let records = read_records(file.path()).unwrap();
        assert_eq!(records.rows[0][1], Some(r#"["a","b"]"#.to_owned()));
    }

    #[test]
    fn non_object_line_is_invalid() {
        let file = write_ndjson("[1,2,3]\n");
        let err = read_records(file.path()).unwrap_err();
        assert!(matches!(err, IngestError::InvalidFormat { .. }));
    }

    #[test]
    fn malformed_json_reports_line() {
        let file = write_ndjson("{\"id\":\"r1\"}\n{broken\n");
        let err = read_records(file.path()).unwrap_err();
        match err {
            IngestError::Json { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unsafe_field_names_are_rejected() {
        let file = write_ndjson(r#"{"id;drop":"r1"}"#);
        let err = read_records(file.path()).unwrap_err();
        assert!(matches!(err, IngestError::Identifier(_)));
    }
}
