//! Conversion of raw column values into richer representations.

use crate::error::{value_type_name, Error};
use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

/// Converts a raw column value into its semantic representation.
///
/// `Value::Null` passes through untouched for every type. A platform
/// adapter with richer database-native type semantics can be substituted
/// anywhere a converter is accepted.
pub trait TypeConverter {
    fn convert(&self, value: Value, type_name: &str) -> Result<Value, Error>;
}

/// Built-in converter for the simple types:
/// `int`, `float`, `bool`, `string`, `datetime` and `json`.
///
/// `datetime` accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DD`
/// input and produces a unix timestamp. `json` decodes JSON text into a
/// nested structure.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleTypeConverter;

impl TypeConverter for SimpleTypeConverter {
    fn convert(&self, value: Value, type_name: &str) -> Result<Value, Error> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        match type_name {
            "int" => to_int(value).map_err(|source| conversion(type_name, source)),
            "float" => to_float(value).map_err(|source| conversion(type_name, source)),
            "bool" => Ok(to_bool(value)),
            "string" => Ok(to_string(value)),
            "datetime" => to_datetime(value).map_err(|source| conversion(type_name, source)),
            "json" => to_json(value).map_err(|source| conversion(type_name, source)),
            name => Err(Error::UnknownType {
                name: name.to_string(),
            }),
        }
    }
}

fn conversion(type_name: &str, source: anyhow::Error) -> Error {
    Error::Conversion {
        type_name: type_name.to_string(),
        source,
    }
}

fn to_int(value: Value) -> anyhow::Result<Value> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::from(f as i64))
            } else {
                Err(anyhow!("number {} is out of integer range", n))
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();

            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Value::from(i));
            }

            let f: f64 = trimmed.parse()?;
            Ok(Value::from(f as i64))
        }
        Value::Bool(b) => Ok(Value::from(b as i64)),
        other => Err(anyhow!("cannot cast {} to integer", value_type_name(&other))),
    }
}

fn to_float(value: Value) -> anyhow::Result<Value> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(Value::from)
            .ok_or_else(|| anyhow!("number {} is out of float range", n)),
        Value::String(s) => {
            let f: f64 = s.trim().parse()?;
            Ok(Value::from(f))
        }
        Value::Bool(b) => Ok(Value::from(if b { 1.0 } else { 0.0 })),
        other => Err(anyhow!("cannot cast {} to float", value_type_name(&other))),
    }
}

fn to_bool(value: Value) -> Value {
    let b = match &value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty() && s != "0",
        _ => true,
    };

    Value::Bool(b)
}

fn to_string(value: Value) -> Value {
    let s = match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    };

    Value::String(s)
}

fn to_datetime(value: Value) -> anyhow::Result<Value> {
    let Value::String(s) = value else {
        return Err(anyhow!(
            "cannot parse {} as datetime, expected string",
            value_type_name(&value)
        ));
    };

    Ok(Value::from(parse_timestamp(&s)?))
}

fn parse_timestamp(s: &str) -> anyhow::Result<i64> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Ok(dt.timestamp()),
        Err(rfc3339_err) => {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Ok(dt.and_utc().timestamp());
            }

            if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return Ok(date.and_time(NaiveTime::MIN).and_utc().timestamp());
            }

            Err(anyhow::Error::new(rfc3339_err).context(format!("unrecognized datetime {s:?}")))
        }
    }
}

fn to_json(value: Value) -> anyhow::Result<Value> {
    let Value::String(s) = value else {
        return Err(anyhow!(
            "cannot parse {} as JSON, expected string",
            value_type_name(&value)
        ));
    };

    Ok(serde_json::from_str(&s)?)
}
