use crate::error::Error;
use crate::processor::{Processor, RowStream};
use crate::selector::{CompiledSelector, Selector};
use crate::{into_row, path, Row};
use once_cell::unsync::OnceCell;
use serde_json::Value;

/// Collects columns into an embedded item or a collection of items.
///
/// The selector is compiled once against the first row and replayed
/// against every following row. Selected source columns are removed from
/// the row unless explicitly preserved. A projection where every value is
/// null or an empty list becomes `null`; attached through a path with a
/// trailing wildcard it becomes an empty collection instead.
#[derive(Debug)]
pub struct EmbeddedProcessor<S> {
    path: String,
    selector: S,
    preserved_columns: Vec<String>,
    compiled: OnceCell<Compiled>,
}

#[derive(Debug)]
struct Compiled {
    selector: CompiledSelector,
    removed_columns: Vec<String>,
}

impl<S: Selector> EmbeddedProcessor<S> {
    pub fn new(path: impl Into<String>, selector: S) -> Result<Self, Error> {
        let path = path.into();

        if path.is_empty() {
            return Err(Error::EmptyPath);
        }

        Ok(EmbeddedProcessor {
            path,
            selector,
            preserved_columns: Vec::new(),
            compiled: OnceCell::new(),
        })
    }

    /// Keeps the listed source columns at their original position instead
    /// of removing them from the row.
    pub fn preserving<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.preserved_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    fn embed(&self, mut row: Row) -> Result<Row, Error> {
        let compiled = self.compiled.get_or_try_init(|| {
            let selector = self.selector.compile(&row)?;

            let removed_columns = selector
                .selected_columns()
                .iter()
                .map(|(_, name)| name.clone())
                .filter(|name| !self.preserved_columns.contains(name))
                .collect();

            Ok::<_, Error>(Compiled {
                selector,
                removed_columns,
            })
        })?;

        let embedded = compiled.selector.apply(&row)?;

        for column in &compiled.removed_columns {
            row.remove(column);
        }

        let embedded = if is_empty_item(&embedded) {
            Value::Null
        } else {
            Value::Object(embedded)
        };

        let mut data = Value::Object(row);
        path::set(&mut data, &self.path, embedded)?;

        into_row(data)
    }
}

fn is_empty_item(item: &Row) -> bool {
    item.values()
        .all(|value| value.is_null() || matches!(value, Value::Array(items) if items.is_empty()))
}

impl<S: Selector> Processor for EmbeddedProcessor<S> {
    fn process<'a>(self, rows: RowStream<'a>) -> RowStream<'a>
    where
        Self: Sized + 'a,
    {
        Box::new(rows.map(move |row| row.and_then(|row| self.embed(row))))
    }
}
