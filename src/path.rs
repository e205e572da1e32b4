//! Dot-notation access to nested row structures.
//!
//! Path grammar:
//!
//! - `"id"` addresses `data["id"]`
//! - `"user.subscriptions"` addresses `data["user"]["subscriptions"]`
//! - `"user.subscriptions[]"` addresses each element of that list
//! - `"user.subscriptions[].id"` addresses field `id` of each element
//! - `""` addresses `data` itself
//! - `"[]"` addresses each element when `data` itself is a list
//!
//! A missing or null field along the path resolves to nothing and the
//! operation silently skips that branch. A present value of the wrong
//! shape (addressing a scalar as if it were a container) is an
//! [`Error::InvalidPath`].

use crate::error::{value_type_name, Error};
use serde_json::Value;

#[derive(Debug, Clone)]
struct Segment {
    name: String,
    expand: bool,
}

/// Applies `mapper` to every value addressed by `path`, in place.
pub fn map<F>(data: &mut Value, path: &str, mut mapper: F) -> Result<(), Error>
where
    F: FnMut(Value) -> Result<Value, Error>,
{
    let segments = parse(path);

    for_each(data, &segments, "", &mut |slot, _trail| {
        let taken = std::mem::take(slot);
        *slot = mapper(taken)?;
        Ok(())
    })
}

/// Assigns `value` at `path`, creating the final field if absent.
///
/// A trailing wildcard stores a non-null value as a one-element list and a
/// null value as an empty list. The root path replaces `data` entirely.
/// All intermediate segments must already exist as containers; a missing
/// intermediate field makes the assignment a silent no-op.
pub fn set(data: &mut Value, path: &str, value: Value) -> Result<(), Error> {
    let segments = parse(path);

    let Some((last, parents)) = segments.split_last() else {
        *data = value;
        return Ok(());
    };

    for_each(data, parents, "", &mut |parent, trail| {
        assign(parent, last, value.clone(), trail)
    })
}

fn assign(parent: &mut Value, segment: &Segment, value: Value, trail: &str) -> Result<(), Error> {
    // "[]" as the final segment addresses the parent itself
    if segment.name.is_empty() {
        *parent = wrap_item(value);
        return Ok(());
    }

    let map = match parent {
        Value::Object(map) => map,
        other => {
            return Err(Error::InvalidPath {
                path: join_path(trail, segment),
                expected: "map",
                actual: value_type_name(other),
            })
        }
    };

    let value = if segment.expand { wrap_item(value) } else { value };
    map.insert(segment.name.clone(), value);

    Ok(())
}

fn wrap_item(value: Value) -> Value {
    if value.is_null() {
        Value::Array(Vec::new())
    } else {
        Value::Array(vec![value])
    }
}

fn parse(path: &str) -> Vec<Segment> {
    if path.is_empty() {
        return Vec::new();
    }

    path.split('.')
        .filter_map(|raw| {
            let (name, expand) = match raw.strip_suffix("[]") {
                Some(name) => (name, true),
                None => (raw, false),
            };

            if name.is_empty() && !expand {
                return None; // empty segments collapse
            }

            Some(Segment {
                name: name.to_string(),
                expand,
            })
        })
        .collect()
}

/// Walks `data` along `segments` and invokes `visit` on every addressed
/// value together with its path so far.
fn for_each(
    data: &mut Value,
    segments: &[Segment],
    trail: &str,
    visit: &mut dyn FnMut(&mut Value, &str) -> Result<(), Error>,
) -> Result<(), Error> {
    let Some((segment, rest)) = segments.split_first() else {
        return visit(data, trail);
    };

    let field_path = join_path(trail, segment);

    let value = if segment.name.is_empty() {
        data
    } else {
        match data {
            Value::Object(map) => match map.get_mut(&segment.name) {
                Some(value) if !value.is_null() => value,
                _ => return Ok(()),
            },
            // a named field inside a list never matches
            _ => return Ok(()),
        }
    };

    if segment.expand {
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(Error::InvalidPath {
                    // drop the trailing "[]": the error is about the list itself
                    path: field_path[..field_path.len() - 2].to_string(),
                    expected: "list",
                    actual: value_type_name(other),
                })
            }
        };

        for item in items {
            if rest.is_empty() {
                visit(item, &field_path)?;
                continue;
            }

            if !item.is_object() && !item.is_array() {
                return Err(Error::InvalidPath {
                    path: field_path.clone(),
                    expected: "map or list",
                    actual: value_type_name(item),
                });
            }

            for_each(item, rest, &field_path, visit)?;
        }

        return Ok(());
    }

    if rest.is_empty() {
        return visit(value, trail);
    }

    if !value.is_object() && !value.is_array() {
        return Err(Error::InvalidPath {
            path: field_path,
            expected: "map or list",
            actual: value_type_name(value),
        });
    }

    for_each(value, rest, &field_path, visit)
}

fn join_path(trail: &str, segment: &Segment) -> String {
    let suffix = if segment.expand { "[]" } else { "" };

    if trail.is_empty() {
        format!("{}{}", segment.name, suffix)
    } else {
        format!("{}.{}{}", trail, segment.name, suffix)
    }
}
