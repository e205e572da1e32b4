//! Column selection strategies.
//!
//! A [`Selector`] filters specific columns out of a row. Because every row
//! of a result set shares the same column layout, a selector can be
//! [compiled](Selector::compile) once against a sample row into a fixed
//! alias-to-name mapping that is replayed against every following row.

mod names;
mod prefix;

pub use names::NamesSelector;
pub use prefix::PrefixSelector;

use crate::error::Error;
use crate::Row;

/// Filters specific columns from a row.
pub trait Selector {
    /// Generates an optimized selector based on the provided sample row.
    fn compile(&self, row: &Row) -> Result<CompiledSelector, Error>;

    /// Applies selector rules to a row and returns the matched columns.
    fn apply(&self, row: &Row) -> Result<Row, Error>;
}

/// Optimized selector generated from a concrete selector and the columns
/// of a template row. Use [`Selector::compile`] to obtain one.
#[derive(Debug, Clone)]
pub struct CompiledSelector {
    columns: Vec<(String, String)>,
}

impl CompiledSelector {
    pub(crate) fn new(columns: Vec<(String, String)>) -> Self {
        CompiledSelector { columns }
    }

    /// Selected `(alias, source name)` pairs.
    pub fn selected_columns(&self) -> &[(String, String)] {
        &self.columns
    }
}

impl Selector for CompiledSelector {
    fn compile(&self, _row: &Row) -> Result<CompiledSelector, Error> {
        Ok(self.clone())
    }

    fn apply(&self, row: &Row) -> Result<Row, Error> {
        let mut result = Row::new();

        for (alias, name) in &self.columns {
            let value = row.get(name).ok_or_else(|| Error::UnknownColumn {
                name: name.clone(),
            })?;

            result.insert(alias.clone(), value.clone());
        }

        Ok(result)
    }
}
