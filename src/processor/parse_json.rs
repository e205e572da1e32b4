use crate::error::{value_type_name, Error};
use crate::processor::{Processor, RowStream};
use crate::Row;
use anyhow::anyhow;
use serde_json::Value;

/// Decodes JSON-encoded string columns into structured values.
///
/// Database drivers commonly return `json`/`jsonb` columns as raw strings;
/// this stage turns them back into maps and lists so later stages can
/// address them by path. Absent and null columns are left alone.
pub struct ParseJsonColumnsProcessor {
    columns: Vec<String>,
}

impl ParseJsonColumnsProcessor {
    pub fn new<I, C>(columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        ParseJsonColumnsProcessor {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    fn parse_row(&self, mut row: Row) -> Result<Row, Error> {
        for column in &self.columns {
            let value = match row.get(column) {
                None | Some(Value::Null) => continue,
                Some(value) => value,
            };

            let Value::String(text) = value else {
                return Err(Error::InvalidJson {
                    column: column.clone(),
                    source: anyhow!("expected JSON string, got {}", value_type_name(value)),
                });
            };

            let parsed = serde_json::from_str(text).map_err(|err| Error::InvalidJson {
                column: column.clone(),
                source: err.into(),
            })?;

            row.insert(column.clone(), parsed);
        }

        Ok(row)
    }
}

impl Processor for ParseJsonColumnsProcessor {
    fn process<'a>(self, rows: RowStream<'a>) -> RowStream<'a>
    where
        Self: Sized + 'a,
    {
        Box::new(rows.map(move |row| row.and_then(|row| self.parse_row(row))))
    }
}
