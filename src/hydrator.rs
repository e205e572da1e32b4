//! Turning rows into application types.
//!
//! Two strategies are provided: [`SimpleHydrator`] delegates to a manual
//! [`FromRow`] implementation, [`SerdeHydrator`] deserializes through
//! `serde`. Both report failures as [`Error::HydrationFailed`] with the
//! target type name attached.

use crate::error::Error;
use crate::Row;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;

/// Manual construction of a type from a row.
pub trait FromRow: Sized {
    fn from_row(row: Row) -> anyhow::Result<Self>;
}

/// Converts rows into values of `T`.
pub trait Hydrator<T> {
    fn hydrate(&self, row: Row) -> Result<T, Error>;
}

/// Hydrates through the type's own [`FromRow`] implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleHydrator;

impl<T: FromRow> Hydrator<T> for SimpleHydrator {
    fn hydrate(&self, row: Row) -> Result<T, Error> {
        T::from_row(row).map_err(|err| Error::HydrationFailed {
            target: std::any::type_name::<T>(),
            source: err,
        })
    }
}

/// Hydrates by deserializing the row as a JSON map.
pub struct SerdeHydrator<T> {
    target: PhantomData<fn() -> T>,
}

impl<T> SerdeHydrator<T> {
    pub fn new() -> Self {
        SerdeHydrator {
            target: PhantomData,
        }
    }
}

impl<T> Default for SerdeHydrator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> Hydrator<T> for SerdeHydrator<T> {
    fn hydrate(&self, row: Row) -> Result<T, Error> {
        serde_json::from_value(Value::Object(row)).map_err(|err| Error::HydrationFailed {
            target: std::any::type_name::<T>(),
            source: err.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize)]
    struct User {
        id: i64,
        name: String,
    }

    impl FromRow for User {
        fn from_row(row: Row) -> anyhow::Result<Self> {
            Ok(User {
                id: row
                    .get("id")
                    .and_then(Value::as_i64)
                    .context("missing or non-integer \"id\"")?,
                name: row
                    .get("name")
                    .and_then(Value::as_str)
                    .context("missing or non-string \"name\"")?
                    .to_string(),
            })
        }
    }

    fn row(value: serde_json::Value) -> Row {
        value.as_object().expect("row fixture").clone()
    }

    #[test]
    fn simple_hydrator_builds_the_target() {
        let user: User = SimpleHydrator
            .hydrate(row(json!({"id": 1, "name": "user #1"})))
            .unwrap();

        assert_eq!(
            user,
            User {
                id: 1,
                name: "user #1".to_string()
            }
        );
    }

    #[test]
    fn simple_hydrator_reports_the_target_type() {
        let err = <SimpleHydrator as Hydrator<User>>::hydrate(
            &SimpleHydrator,
            row(json!({"id": "not a number"})),
        )
        .unwrap_err();

        assert!(matches!(err, Error::HydrationFailed { target, .. } if target.ends_with("User")));
    }

    #[test]
    fn serde_hydrator_builds_the_target() {
        let user: User = SerdeHydrator::new()
            .hydrate(row(json!({"id": 2, "name": "user #2"})))
            .unwrap();

        assert_eq!(
            user,
            User {
                id: 2,
                name: "user #2".to_string()
            }
        );
    }

    #[test]
    fn serde_hydrator_fails_on_missing_field() {
        let err = SerdeHydrator::<User>::new()
            .hydrate(row(json!({"id": 2})))
            .unwrap_err();

        assert!(matches!(err, Error::HydrationFailed { .. }));
    }
}
