//! Row model and the grouping index.
//!
//! A [`Row`] is one record returned by a warehouse query: an ordered
//! column-name-to-value mapping. Rows are immutable once fetched and have
//! no identity beyond their position in the flat result sequence.
//!
//! [`group_by_fk`] is the one-to-many index both assemblers are built on:
//! it maps each distinct non-null foreign-key value to the rows sharing
//! it, preserving row order within each group. Rows without a usable key
//! are dropped silently: absent optional relations are normal, not an
//! error.

use std::collections::HashMap;

use serde_json::Value;

/// One warehouse record, keyed by column name.
pub type Row = serde_json::Map<String, Value>;

/// Canonical string form of a scalar key value.
///
/// Strings are used verbatim; numbers and booleans use their JSON text.
/// Null, arrays, and objects have no key form and return `None`.
pub fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Collect the key values present at `column` across `rows`, in row order.
///
/// Rows missing the column or holding a non-scalar value contribute
/// nothing. The result feeds the batched `= ANY(...)` child fetches.
pub fn column_keys(rows: &[Row], column: &str) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.get(column).and_then(scalar_key))
        .collect()
}

/// Build a one-to-many index from a key to the items sharing it.
///
/// Items for which `key_of` returns `None` appear in no group. Relative
/// input order is preserved within each group.
pub fn group_by_fk<T>(
    items: Vec<T>,
    key_of: impl Fn(&T) -> Option<String>,
) -> HashMap<String, Vec<T>> {
    let mut grouped: HashMap<String, Vec<T>> = HashMap::new();
    for item in items {
        let Some(key) = key_of(&item) else {
            continue;
        };
        grouped.entry(key).or_default().push(item);
    }
    grouped
}
