//! Composable row-stream transformation stages.
//!
//! A processor consumes a [`RowStream`] and returns a new one. Stages are
//! lazy: each row is emitted as soon as its predecessor emits it, except
//! for the deliberately buffering stages (aggregate parsing and root-level
//! merging) which drain their upstream before producing output. Errors
//! travel through the stream as `Err` items and terminate the affected
//! row's processing.

mod column_type;
mod embedded;
mod hydrate;
mod merge;
mod parse_json;

pub use column_type::{ColumnType, ColumnTypeProcessor};
pub use embedded::EmbeddedProcessor;
pub use hydrate::HydrateProcessor;
pub use merge::MergeProcessor;
pub use parse_json::ParseJsonColumnsProcessor;

use crate::error::Error;
use crate::node::{Node, SimpleNode};
use crate::Row;

/// A pull-based stream of rows, each possibly failed.
pub type RowStream<'a> = Box<dyn Iterator<Item = Result<Row, Error>> + 'a>;

/// A row-stream transformation stage.
///
/// The stage is consumed into the returned stream; configuration captured
/// at construction is immutable from then on. Clone a stage to reuse it
/// for another stream of the same column shape.
pub trait Processor {
    fn process<'a>(self, rows: RowStream<'a>) -> RowStream<'a>
    where
        Self: Sized + 'a;
}

/// Aggregate relation parsing as a stage: drains the upstream, walks every
/// row through the node tree and emits the deduplicated records.
impl<'n> Processor for &'n Node {
    fn process<'a>(self, rows: RowStream<'a>) -> RowStream<'a>
    where
        Self: Sized + 'a,
    {
        let mut source = Some(rows);
        let mut records: std::vec::IntoIter<Row> = Vec::new().into_iter();
        let mut failed = false;

        Box::new(std::iter::from_fn(move || {
            if failed {
                return None;
            }

            if let Some(rows) = source.take() {
                let parsed = rows
                    .collect::<Result<Vec<_>, _>>()
                    .and_then(|rows| self.parse_rows(rows));

                match parsed {
                    Ok(parsed) => records = parsed.into_iter(),
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

/// Pass-through projection as a stage: one row in, one projected row out.
impl<'n> Processor for &'n SimpleNode {
    fn process<'a>(self, rows: RowStream<'a>) -> RowStream<'a>
    where
        Self: Sized + 'a,
    {
        Box::new(rows.map(move |row| row.and_then(|row| self.parse_row(&row))))
    }
}
