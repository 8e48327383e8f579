//! CSV file parsing for bulk loads.
//!
//! The header row supplies the destination column names; every header is
//! identifier-validated before it can reach generated SQL. Empty fields
//! load as NULL (CSV has no null literal).

use std::path::Path;

use csv::ReaderBuilder;

use gradebook_core::SafeIdentifier;

use super::{IngestError, Records};

pub(crate) fn read_records(path: &Path) -> Result<Records, IngestError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let columns = reader
        .headers()?
        .iter()
        .map(|header| SafeIdentifier::new(header.trim(), "CSV column header"))
        .collect::<Result<Vec<_>, _>>()?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        None
                    } else {
                        Some(field.to_owned())
                    }
                })
                .collect(),
        );
    }

    Ok(Records { columns, rows })
}
