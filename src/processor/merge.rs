use crate::error::{value_type_name, Error};
use crate::processor::{Processor, RowStream};
use crate::{into_row, path, Row};
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde_json::Value;

/// Merges duplicate items of a collection by a distinct key.
///
/// With a non-empty path the stage streams: each row has the collection at
/// that path deduplicated independently. With an empty path the whole
/// stream is treated as the collection, which requires draining the
/// upstream before any merged row can be emitted.
///
/// Items sharing a distinct key are folded into the first occurrence:
/// lists are concatenated, maps are merged recursively, scalars keep the
/// first-seen value, and fields the first occurrence lacks are dropped.
/// Distinct key fields must resolve to scalars; a null, missing or
/// container value fails the stream.
#[derive(Debug)]
pub struct MergeProcessor {
    path: String,
    distinct_by: Vec<String>,
}

impl MergeProcessor {
    pub fn new<I, C>(path: impl Into<String>, distinct_by: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let distinct_by: Vec<String> = distinct_by.into_iter().map(Into::into).collect();

        if distinct_by.is_empty() {
            return Err(Error::EmptyDistinctKey);
        }

        Ok(MergeProcessor {
            path: path.into(),
            distinct_by,
        })
    }

    /// Merges the row stream itself instead of a collection inside rows.
    pub fn root<I, C>(distinct_by: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self::new("", distinct_by)
    }

    fn merge_all(&self, rows: Vec<Row>) -> Result<Vec<Row>, Error> {
        let mut merged: IndexMap<String, Row> = IndexMap::new();

        for row in rows {
            match merged.entry(self.distinct_hash(&row)?) {
                Entry::Occupied(mut entry) => merge_rows(entry.get_mut(), row),
                Entry::Vacant(entry) => {
                    entry.insert(row);
                }
            }
        }

        Ok(merged.into_values().collect())
    }

    fn merge_at_path(&self, row: Row) -> Result<Row, Error> {
        let mut data = Value::Object(row);

        path::map(&mut data, &self.path, |value| {
            let items = match value {
                Value::Array(items) => items,
                other => {
                    return Err(Error::InvalidPath {
                        path: self.path.clone(),
                        expected: "list",
                        actual: value_type_name(&other),
                    })
                }
            };

            let mut merged: IndexMap<String, Row> = IndexMap::new();

            for item in items {
                let item = match item {
                    Value::Object(item) => item,
                    other => {
                        return Err(Error::InvalidPath {
                            path: format!("{}[]", self.path),
                            expected: "map",
                            actual: value_type_name(&other),
                        })
                    }
                };

                match merged.entry(self.distinct_hash(&item)?) {
                    Entry::Occupied(mut entry) => merge_rows(entry.get_mut(), item),
                    Entry::Vacant(entry) => {
                        entry.insert(item);
                    }
                }
            }

            Ok(Value::Array(merged.into_values().map(Value::Object).collect()))
        })?;

        into_row(data)
    }

    fn distinct_hash(&self, item: &Row) -> Result<String, Error> {
        let mut hash = String::new();

        for column in &self.distinct_by {
            let value = item.get(column).unwrap_or(&Value::Null);

            hash.push('\0');
            match value {
                Value::String(text) => hash.push_str(text),
                Value::Number(number) => hash.push_str(&number.to_string()),
                Value::Bool(flag) => hash.push_str(if *flag { "true" } else { "false" }),
                other => {
                    return Err(Error::InvalidKey {
                        column: column.clone(),
                        actual: value_type_name(other),
                    })
                }
            }
        }

        Ok(hash)
    }
}

/// Folds `incoming` into `existing` field by field. Lists concatenate,
/// maps recurse, anything else keeps the existing value. Fields absent
/// from `existing` are ignored: the first-seen item defines the shape.
fn merge_rows(existing: &mut Row, incoming: Row) {
    for (column, value) in incoming {
        if let Some(current) = existing.get_mut(&column) {
            merge_values(current, value);
        }
    }
}

fn merge_values(current: &mut Value, incoming: Value) {
    match (current, incoming) {
        (Value::Array(items), Value::Array(more)) => items.extend(more),
        (Value::Object(map), Value::Object(incoming)) => merge_rows(map, incoming),
        _ => {}
    }
}

impl Processor for MergeProcessor {
    fn process<'a>(self, rows: RowStream<'a>) -> RowStream<'a>
    where
        Self: Sized + 'a,
    {
        if !self.path.is_empty() {
            return Box::new(rows.map(move |row| row.and_then(|row| self.merge_at_path(row))));
        }

        let mut source = Some(rows);
        let mut records: std::vec::IntoIter<Row> = Vec::new().into_iter();
        let mut failed = false;

        Box::new(std::iter::from_fn(move || {
            if failed {
                return None;
            }

            if let Some(rows) = source.take() {
                let merged = rows
                    .collect::<Result<Vec<_>, _>>()
                    .and_then(|rows| self.merge_all(rows));

                match merged {
                    Ok(merged) => records = merged.into_iter(),
                    Err(err) => {
                        failed = true;
                        return Some(Err(err));
                    }
                }
            }

            records.next().map(Ok)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResultSet;
    use serde_json::json;

    fn rows(values: serde_json::Value) -> Vec<Row> {
        values
            .as_array()
            .expect("rows fixture")
            .iter()
            .map(|value| value.as_object().expect("row fixture").clone())
            .collect()
    }

    #[test]
    fn create_with_empty_distinct_key() {
        let err = MergeProcessor::new("subs", Vec::<String>::new()).unwrap_err();

        assert!(matches!(err, Error::EmptyDistinctKey));
    }

    #[test]
    fn merge_rows_at_root() {
        let processor = MergeProcessor::root(["id"]).unwrap();

        let result = ResultSet::new(rows(json!([
            {"id": 1, "subs": [{"id": 10}]},
            {"id": 2, "subs": [{"id": 20}]},
            {"id": 1, "subs": [{"id": 11}]},
        ])))
        .with_processor(processor)
        .fetch_all()
        .unwrap();

        assert_eq!(
            result,
            rows(json!([
                {"id": 1, "subs": [{"id": 10}, {"id": 11}]},
                {"id": 2, "subs": [{"id": 20}]},
            ]))
        );
    }

    #[test]
    fn merge_collection_at_path() {
        let processor = MergeProcessor::new("subs", ["id"]).unwrap();

        let result = ResultSet::new(rows(json!([{
            "id": 1,
            "subs": [
                {"id": 10, "features": ["A"]},
                {"id": 10, "features": ["B"]},
                {"id": 20, "features": ["C"]},
            ],
        }])))
        .with_processor(processor)
        .fetch_all()
        .unwrap();

        assert_eq!(
            result,
            rows(json!([{
                "id": 1,
                "subs": [
                    {"id": 10, "features": ["A", "B"]},
                    {"id": 20, "features": ["C"]},
                ],
            }]))
        );
    }

    #[test]
    fn merge_by_composite_distinct_key() {
        let processor = MergeProcessor::new("subs", ["type", "level"]).unwrap();

        let result = ResultSet::new(rows(json!([{
            "subs": [
                {"type": "A", "level": 1, "tags": ["x"]},
                {"type": "A", "level": 2, "tags": ["y"]},
                {"type": "A", "level": 1, "tags": ["z"]},
            ],
        }])))
        .with_processor(processor)
        .fetch_all()
        .unwrap();

        assert_eq!(
            result,
            rows(json!([{
                "subs": [
                    {"type": "A", "level": 1, "tags": ["x", "z"]},
                    {"type": "A", "level": 2, "tags": ["y"]},
                ],
            }]))
        );
    }

    #[test]
    fn merge_maps_recursively_and_keeps_first_scalar() {
        let processor = MergeProcessor::root(["id"]).unwrap();

        let result = ResultSet::new(rows(json!([
            {"id": 1, "name": "first", "meta": {"tags": ["a"], "note": "x"}},
            {"id": 1, "name": "second", "meta": {"tags": ["b"]}},
        ])))
        .with_processor(processor)
        .fetch_all()
        .unwrap();

        assert_eq!(
            result,
            rows(json!([{
                "id": 1,
                "name": "first",
                "meta": {"tags": ["a", "b"], "note": "x"},
            }]))
        );
    }

    #[test]
    fn merge_drops_fields_missing_from_first_item() {
        let processor = MergeProcessor::root(["id"]).unwrap();

        let result = ResultSet::new(rows(json!([
            {"id": 1, "name": "first"},
            {"id": 1, "extra": true, "tags": ["a"]},
        ])))
        .with_processor(processor)
        .fetch_all()
        .unwrap();

        assert_eq!(result, rows(json!([{"id": 1, "name": "first"}])));
    }

    #[test]
    fn merge_drops_nested_fields_missing_from_first_item() {
        let processor = MergeProcessor::new("subs", ["id"]).unwrap();

        let result = ResultSet::new(rows(json!([{
            "subs": [
                {"id": 10, "meta": {"tags": ["a"]}},
                {"id": 10, "meta": {"tags": ["b"], "note": "late"}},
            ],
        }])))
        .with_processor(processor)
        .fetch_all()
        .unwrap();

        assert_eq!(
            result,
            rows(json!([{
                "subs": [{"id": 10, "meta": {"tags": ["a", "b"]}}],
            }]))
        );
    }

    #[test]
    fn merge_is_idempotent_on_distinct_items() {
        let processor = MergeProcessor::new("subs", ["id"]).unwrap();

        let input = rows(json!([{"id": 1, "subs": [{"id": 10}, {"id": 20}]}]));

        let result = ResultSet::new(input.clone())
            .with_processor(processor)
            .fetch_all()
            .unwrap();

        assert_eq!(result, input);
    }

    #[test]
    fn non_scalar_distinct_key_fails() {
        let processor = MergeProcessor::new("subs", ["id"]).unwrap();

        let err = ResultSet::new(rows(json!([{
            "subs": [{"id": {"nested": 1}}],
        }])))
        .with_processor(processor)
        .fetch_all()
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "only scalar values are allowed as distinct key, got map at column \"id\""
        );
    }

    #[test]
    fn missing_distinct_key_fails() {
        let processor = MergeProcessor::root(["id"]).unwrap();

        let err = ResultSet::new(rows(json!([{"name": "no id"}])))
            .with_processor(processor)
            .fetch_all()
            .unwrap_err();

        assert!(matches!(err, Error::InvalidKey { .. }));
    }

    #[test]
    fn non_list_value_at_path_fails() {
        let processor = MergeProcessor::new("subs", ["id"]).unwrap();

        let err = ResultSet::new(rows(json!([{"id": 1, "subs": "oops"}])))
            .with_processor(processor)
            .fetch_all()
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "unexpected value at path \"subs\", expected list, got string"
        );
    }

    #[test]
    fn root_merge_emits_nothing_after_upstream_error() {
        let processor = MergeProcessor::root(["id"]).unwrap();

        let mut result = ResultSet::from_fallible([
            Ok(rows(json!([{"id": 1}])).remove(0)),
            Err(Error::EmptyResult),
        ])
        .with_processor(processor);

        assert!(result.fetch().is_err());
        assert!(result.fetch().unwrap().is_none());
    }
}
