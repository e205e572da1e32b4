use crate::error::Error;
use crate::node::Column;
use crate::selector::{CompiledSelector, Selector};
use crate::Row;

/// Selects columns by an explicit list of names, with optional aliases.
#[derive(Debug, Clone)]
pub struct NamesSelector {
    columns: Vec<Column>,
}

impl NamesSelector {
    /// Accepts plain names (`"id"`) or `(alias, source)` pairs
    /// (`("id", "subscription_id")`).
    pub fn new<I, C>(columns: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = C>,
        C: Into<Column>,
    {
        let columns: Vec<Column> = columns.into_iter().map(Into::into).collect();

        if columns.is_empty() {
            return Err(Error::EmptyColumns);
        }

        Ok(NamesSelector { columns })
    }

    fn columns_map(&self) -> Vec<(String, String)> {
        self.columns
            .iter()
            .map(|column| (column.alias.clone(), column.name.clone()))
            .collect()
    }
}

impl Selector for NamesSelector {
    fn compile(&self, _row: &Row) -> Result<CompiledSelector, Error> {
        Ok(CompiledSelector::new(self.columns_map()))
    }

    fn apply(&self, row: &Row) -> Result<Row, Error> {
        let mut result = Row::new();

        for column in &self.columns {
            let value = row.get(&column.name).ok_or_else(|| Error::UnknownColumn {
                name: column.name.clone(),
            })?;

            result.insert(column.alias.clone(), value.clone());
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().expect("row fixture").clone()
    }

    #[test]
    fn create_without_columns() {
        let err = NamesSelector::new(Vec::<&str>::new()).unwrap_err();

        assert!(matches!(err, Error::EmptyColumns));
    }

    #[test]
    fn select_columns() {
        let selector = NamesSelector::new(["id", "name"]).unwrap();

        let result = selector
            .apply(&row(json!({"id": 1, "name": "user #1", "country": "BY"})))
            .unwrap();

        assert_eq!(result, row(json!({"id": 1, "name": "user #1"})));
    }

    #[test]
    fn select_columns_with_alias() {
        let selector = NamesSelector::new([("user_name", "name")]).unwrap();

        let result = selector.apply(&row(json!({"id": 1, "name": "user #1"}))).unwrap();

        assert_eq!(result, row(json!({"user_name": "user #1"})));
    }

    #[test]
    fn select_missing_column() {
        let selector = NamesSelector::new(["unknown"]).unwrap();

        let err = selector.apply(&row(json!({"id": 1}))).unwrap_err();

        assert!(matches!(err, Error::UnknownColumn { name } if name == "unknown"));
    }

    #[test]
    fn compile_captures_columns_map() {
        let selector = NamesSelector::new([("id", "id"), ("user_name", "name")]).unwrap();

        let compiled = selector.compile(&row(json!({"id": 1, "name": "user #1"}))).unwrap();

        assert_eq!(
            compiled.selected_columns(),
            &[
                ("id".to_string(), "id".to_string()),
                ("user_name".to_string(), "name".to_string()),
            ]
        );
    }
}
