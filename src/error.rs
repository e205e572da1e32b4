use serde_json::Value;
use thiserror::Error;

/// All failures produced by this crate.
///
/// None of these are retried internally; every error propagates
/// synchronously to the caller of the stage or parse call that hit it.
#[derive(Debug, Error)]
pub enum Error {
    /// A node or selector was built without any columns.
    #[error("column names should be provided")]
    EmptyColumns,

    /// A relational node was built without a primary key.
    #[error("primary key should be provided")]
    EmptyPrimaryKey,

    /// A merge processor was built without a distinct key.
    #[error("distinct key should be provided")]
    EmptyDistinctKey,

    /// A processor that requires a target path was given an empty one.
    #[error("path should not be empty")]
    EmptyPath,

    /// A prefix selector was built with an empty prefix.
    #[error("column prefix should not be empty")]
    EmptyPrefix,

    /// A declared column is missing from the current row.
    #[error("column {name:?} does not exist in result set")]
    UnknownColumn { name: String },

    /// A dot path addressed an existing value of the wrong shape.
    #[error("unexpected value at path {path:?}, expected {expected}, got {actual}")]
    InvalidPath {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A type name not known to the converter in use.
    #[error("unknown type {name:?}")]
    UnknownType { name: String },

    /// A value could not be converted to the requested type.
    #[error("unable to convert value to type {type_name:?}")]
    Conversion {
        type_name: String,
        #[source]
        source: anyhow::Error,
    },

    /// A JSON column held malformed JSON or a non-string value.
    #[error("unable to parse JSON column {column:?}")]
    InvalidJson {
        column: String,
        #[source]
        source: anyhow::Error,
    },

    /// A distinct-key field resolved to a non-scalar value.
    #[error("only scalar values are allowed as distinct key, got {actual} at column {column:?}")]
    InvalidKey {
        column: String,
        actual: &'static str,
    },

    /// A hydrator failed to produce the requested target type.
    #[error("failed to hydrate into {target:?}")]
    HydrationFailed {
        target: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// A single-row root parse found no record (null primary key).
    #[error("row with an empty primary key produced no record")]
    EmptyResult,
}

/// Human-readable shape name for error messages.
pub(crate) fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}
