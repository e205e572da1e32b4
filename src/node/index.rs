use crate::Row;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Storage that indexes materialized records by their primary key.
///
/// Records keep first-seen insertion order. Child relations get their own
/// nested indexes scoped by `(relation name, owner primary key)`, so
/// same-keyed children under different owners never merge.
#[derive(Debug, Default)]
pub(crate) struct Index {
    records: IndexMap<String, Row>,
    nested: HashMap<String, HashMap<String, Index>>,
}

impl Index {
    /// Returns the index for a relation of a specific owner record,
    /// creating it on first access.
    pub fn nested_index(&mut self, name: &str, owner_key: &Row) -> &mut Index {
        self.nested
            .entry(name.to_string())
            .or_default()
            .entry(hash_primary_key(owner_key))
            .or_default()
    }

    /// Stores a record under its primary key, overwriting a previous
    /// occurrence while keeping its original position.
    pub fn set(&mut self, primary_key: &Row, record: Row) {
        self.records.insert(hash_primary_key(primary_key), record);
    }

    pub fn find(&self, primary_key: &Row) -> Option<&Row> {
        self.records.get(&hash_primary_key(primary_key))
    }

    pub fn find_first(&self) -> Option<&Row> {
        self.records.values().next()
    }

    pub fn find_all(&self) -> Vec<Row> {
        self.records.values().cloned().collect()
    }

    pub fn into_records(self) -> Vec<Row> {
        self.records.into_values().collect()
    }

    pub fn into_first(self) -> Option<Row> {
        self.records.into_values().next()
    }
}

/// Order-stable, collision-free hash of a composite primary key.
///
/// Column names and compact-JSON values are framed with `\0` and `\x01`
/// so distinct key sequences can never produce the same text.
fn hash_primary_key(primary_key: &Row) -> String {
    let mut hash = String::new();

    for (column, value) in primary_key {
        hash.push('\0');
        hash.push_str(column);
        hash.push('\u{1}');
        hash.push_str(&value.to_string());
    }

    hash
}
