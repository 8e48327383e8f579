//! Repository implementations over the warehouse executor.
//!
//! Each repository validates its configured identifiers once, at
//! construction, then serves requests with string-built queries binding
//! values only. Child fetches are always batched (`= ANY($1)`), never
//! per-row.

pub mod attempts;
pub mod courses;
pub mod questions;

pub use attempts::{AttemptRepo, AttemptTree};
pub use courses::CourseRepo;
pub use questions::{QuestionRepo, QuestionTree};

use gradebook_core::{scalar_key, Row, SafeIdentifier};

/// Surface rows that would vanish from grouping because their FK column is
/// null or missing. The drop itself stays silent at the grouping level;
/// this keeps the condition observable.
pub(crate) fn note_keyless_rows(rows: &[Row], fk: &SafeIdentifier, child: &'static str) {
    let dropped = rows
        .iter()
        .filter(|row| row.get(fk.as_str()).and_then(scalar_key).is_none())
        .count();
    if dropped > 0 {
        tracing::debug!(
            dropped,
            fk_column = fk.as_str(),
            child,
            "rows without a usable foreign key were skipped during grouping"
        );
    }
}
