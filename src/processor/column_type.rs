use crate::convert::{SimpleTypeConverter, TypeConverter};
use crate::error::Error;
use crate::processor::{Processor, RowStream};
use crate::{into_row, path, Row};
use serde_json::Value;

/// Target of a column type mapping: a name known to the converter in use,
/// or a custom conversion function.
pub enum ColumnType {
    Named(String),
    Custom(Box<dyn Fn(Value) -> Result<Value, Error>>),
}

/// Converts column values into their semantic representation.
///
/// Columns are addressed by dot path, so values inside embedded items and
/// collections can be converted as well. A column absent from a row is
/// silently skipped; null values pass through untouched.
pub struct ColumnTypeProcessor<C = SimpleTypeConverter> {
    converter: C,
    types: Vec<(String, ColumnType)>,
}

impl ColumnTypeProcessor<SimpleTypeConverter> {
    pub fn new() -> Self {
        Self::with_converter(SimpleTypeConverter)
    }
}

impl Default for ColumnTypeProcessor<SimpleTypeConverter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: TypeConverter> ColumnTypeProcessor<C> {
    /// Uses the given converter, e.g. a platform-specific type adapter.
    pub fn with_converter(converter: C) -> Self {
        ColumnTypeProcessor {
            converter,
            types: Vec::new(),
        }
    }

    /// Converts values at `path` to the named type.
    pub fn with_type(mut self, path: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.types
            .push((path.into(), ColumnType::Named(type_name.into())));
        self
    }

    /// Converts values at `path` with a custom function.
    pub fn with_mapper<F>(mut self, path: impl Into<String>, mapper: F) -> Self
    where
        F: Fn(Value) -> Result<Value, Error> + 'static,
    {
        self.types
            .push((path.into(), ColumnType::Custom(Box::new(mapper))));
        self
    }

    fn convert_row(&self, row: Row) -> Result<Row, Error> {
        let mut data = Value::Object(row);

        for (path, column_type) in &self.types {
            path::map(&mut data, path, |value| {
                self.convert_value(value, column_type)
            })?;
        }

        into_row(data)
    }

    fn convert_value(&self, value: Value, column_type: &ColumnType) -> Result<Value, Error> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        match column_type {
            ColumnType::Named(name) => self.converter.convert(value, name),
            ColumnType::Custom(mapper) => mapper(value),
        }
    }
}

impl<C: TypeConverter> Processor for ColumnTypeProcessor<C> {
    fn process<'a>(self, rows: RowStream<'a>) -> RowStream<'a>
    where
        Self: Sized + 'a,
    {
        Box::new(rows.map(move |row| row.and_then(|row| self.convert_row(row))))
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
    fn convert_columns_by_path() {
        let processor = ColumnTypeProcessor::new()
            .with_type("id", "int")
            .with_type("subscriptions[].id", "int");

        let result = ResultSet::new(rows(json!([{
            "id": "1",
            "subscriptions": [{"id": "10"}, {"id": "11"}],
        }])))
        .with_processor(processor)
        .fetch_all()
        .unwrap();

        assert_eq!(
            result,
            rows(json!([{
                "id": 1,
                "subscriptions": [{"id": 10}, {"id": 11}],
            }]))
        );
    }

    #[test]
    fn missing_column_is_skipped() {
        let processor = ColumnTypeProcessor::new().with_type("id", "int");

        let result = ResultSet::new(rows(json!([{"name": "user #1"}])))
            .with_processor(processor)
            .fetch_all()
            .unwrap();

        assert_eq!(result, rows(json!([{"name": "user #1"}])));
    }

    #[test]
    fn null_value_passes_through() {
        let processor = ColumnTypeProcessor::new().with_mapper("id", |_| {
            panic!("mapper must not be called for null values")
        });

        let result = ResultSet::new(rows(json!([{"id": null}])))
            .with_processor(processor)
            .fetch_all()
            .unwrap();

        assert_eq!(result, rows(json!([{"id": null}])));
    }

    #[test]
    fn custom_mapper_is_applied() {
        let processor =
            ColumnTypeProcessor::new().with_mapper("id", |value| {
                Ok(json!(value.as_i64().unwrap() + 10000))
            });

        let result = ResultSet::new(rows(json!([{"id": 1}])))
            .with_processor(processor)
            .fetch_all()
            .unwrap();

        assert_eq!(result, rows(json!([{"id": 10001}])));
    }

    #[test]
    fn conversion_failure_fails_the_row() {
        let processor = ColumnTypeProcessor::new().with_type("id", "int");

        let err = ResultSet::new(rows(json!([{"id": "abc"}])))
            .with_processor(processor)
            .fetch_all()
            .unwrap_err();

        assert!(matches!(err, Error::Conversion { .. }));
    }
}
