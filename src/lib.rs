//! # Rowtree - SQL Result Set Mapping
//!
//! Maps flat rows produced by SQL joins into nested, deduplicated object
//! trees, streaming row by row wherever possible.
//!
//! ## Modules
//!
//! - **node**: Relational parsing - fold duplicated join rows into aggregates
//! - **processor**: Composable row-stream stages (embedding, merging, type
//!   conversion, JSON columns)
//! - **selector**: Column selection by name or prefix
//! - **hydrator**: Conversion of rows into application types
//!
//! ## Quick Start
//!
//! ```rust
//! use rowtree::{Node, ResultSet};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), rowtree::Error> {
//! let rows: Vec<rowtree::Row> = [
//!     json!({"id": 1, "name": "Alice", "sub_id": 10, "sub_type": "PREMIUM"}),
//!     json!({"id": 1, "name": "Alice", "sub_id": 11, "sub_type": "LITE"}),
//!     json!({"id": 2, "name": "Bob", "sub_id": null, "sub_type": null}),
//! ]
//! .into_iter()
//! .map(|row| row.as_object().unwrap().clone())
//! .collect();
//!
//! let node = Node::builder(["id", "name"], ["id"])
//!     .join_collection(
//!         "subscriptions",
//!         Node::builder([("id", "sub_id"), ("type", "sub_type")], ["sub_id"]),
//!     )
//!     .build()?;
//!
//! let users = ResultSet::new(rows).with_processor(&node).fetch_all()?;
//!
//! assert_eq!(users[0]["subscriptions"].as_array().unwrap().len(), 2);
//! assert!(users[1]["subscriptions"].as_array().unwrap().is_empty());
//! # Ok(())
//! # }
//! ```

use serde_json::Value;

pub mod convert;
mod error;
pub mod hydrator;
pub mod node;
mod path;
pub mod processor;
mod result_set;
pub mod selector;

pub use convert::{SimpleTypeConverter, TypeConverter};
pub use error::Error;
pub use hydrator::{FromRow, Hydrator, SerdeHydrator, SimpleHydrator};
pub use node::{Column, Node, NodeBuilder, SimpleNode};
pub use processor::{
    ColumnType, ColumnTypeProcessor, EmbeddedProcessor, HydrateProcessor, MergeProcessor,
    ParseJsonColumnsProcessor, Processor, RowStream,
};
pub use result_set::ResultSet;
pub use selector::{CompiledSelector, NamesSelector, PrefixSelector, Selector};

/// One result-set row: column name to value, in column order.
pub type Row = serde_json::Map<String, Value>;

/// Unwraps a value known to be a map back into a row.
pub(crate) fn into_row(data: Value) -> Result<Row, Error> {
    match data {
        Value::Object(row) => Ok(row),
        other => Err(Error::InvalidPath {
            path: String::new(),
            expected: "map",
            actual: error::value_type_name(&other),
        }),
    }
}
