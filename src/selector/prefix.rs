use crate::error::Error;
use crate::selector::{CompiledSelector, Selector};
use crate::Row;

/// Selects every column whose name starts with a given prefix.
///
/// By default the prefix is stripped from the selected names. It can also
/// be replaced with another string, or kept untouched.
#[derive(Debug, Clone)]
pub struct PrefixSelector {
    prefix: String,
    replace_to: String,
}

impl PrefixSelector {
    /// Selects columns by `prefix` and strips it from their names.
    pub fn new(prefix: impl Into<String>) -> Result<Self, Error> {
        Self::with_replacement(prefix, "")
    }

    /// Selects columns by `prefix` and replaces it with `replace_to`.
    pub fn with_replacement(
        prefix: impl Into<String>,
        replace_to: impl Into<String>,
    ) -> Result<Self, Error> {
        let prefix = prefix.into();

        if prefix.is_empty() {
            return Err(Error::EmptyPrefix);
        }

        Ok(PrefixSelector {
            prefix,
            replace_to: replace_to.into(),
        })
    }

    /// Selects columns by `prefix` and keeps their original names.
    pub fn without_replacement(prefix: impl Into<String>) -> Result<Self, Error> {
        let prefix = prefix.into();
        let replace_to = prefix.clone();

        Self::with_replacement(prefix, replace_to)
    }

    fn match_column(&self, name: &str) -> Option<(String, String)> {
        let stripped = name.strip_prefix(&self.prefix)?;

        // a match that reduces to an empty alias is skipped
        if stripped.is_empty() {
            return None;
        }

        Some((format!("{}{}", self.replace_to, stripped), name.to_string()))
    }
}

impl Selector for PrefixSelector {
    fn compile(&self, row: &Row) -> Result<CompiledSelector, Error> {
        let columns = row
            .keys()
            .filter_map(|name| self.match_column(name))
            .collect();

        Ok(CompiledSelector::new(columns))
    }

    fn apply(&self, row: &Row) -> Result<Row, Error> {
        let mut result = Row::new();

        for (name, value) in row {
            if let Some((alias, _)) = self.match_column(name) {
                result.insert(alias, value.clone());
            }
        }

        Ok(result)
    }
}
