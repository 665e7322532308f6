//! Identifier extraction for entity tables.

use crate::error::{kind_of, Error, Result};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Name of the identity field when a shape does not choose one.
pub const DEFAULT_IDENTITY_FIELD: &str = "id";

/// How a shape derives the identifier of one of its records.
#[derive(Clone)]
pub enum Identity {
    /// Read the identifier from a named field.
    Field(String),
    /// Compute the identifier from the flattened record.
    Derived(fn(&Map<String, Value>) -> Option<Value>),
}

/// An extracted identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    /// Key under which the record is stored in its entity table.
    pub key: String,
    /// The identifier as it appeared in the data.
    pub value: Value,
}

impl Identity {
    /// Identity read from the named field.
    pub fn field(name: impl Into<String>) -> Self {
        Identity::Field(name.into())
    }

    /// Extract the identifier of a flattened record of `entity`.
    ///
    /// Strings are used as keys verbatim and numbers in their canonical JSON
    /// form, so `1` and `1.0` share a key. Any other value, or no value at
    /// all, is a missing identifier.
    pub fn extract(&self, entity: &str, record: &Map<String, Value>) -> Result<Identifier> {
        let value = match self {
            Identity::Field(name) => record.get(name).cloned().ok_or_else(|| {
                Error::MissingIdentifier {
                    entity: entity.to_string(),
                    reason: format!("field `{name}` is absent"),
                }
            })?,
            Identity::Derived(derive) => {
                derive(record).ok_or_else(|| Error::MissingIdentifier {
                    entity: entity.to_string(),
                    reason: "derivation returned no identifier".to_string(),
                })?
            }
        };

        let key = match &value {
            Value::String(s) => s.clone(),
            Value::Number(n) => number_key(n),
            other => {
                return Err(Error::MissingIdentifier {
                    entity: entity.to_string(),
                    reason: format!("identifier is {}", kind_of(other)),
                })
            }
        };

        Ok(Identifier { key, value })
    }
}

/// Table key for a numeric identifier. Integral floats key as integers.
fn number_key(n: &Number) -> String {
    if !n.is_f64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            (f as i64).to_string()
        }
        Some(f) if f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 => (f as u64).to_string(),
        _ => n.to_string(),
    }
}

impl Default for Identity {
    fn default() -> Self {
        Identity::Field(DEFAULT_IDENTITY_FIELD.to_string())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Field(name) => f.debug_tuple("Field").field(name).finish(),
            Identity::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Field(name) => write!(f, "{name}"),
            Identity::Derived(_) => f.write_str("<derived>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_default_reads_id() {
        let id = Identity::default()
            .extract("User", &record(json!({"id": 1, "name": "Ann"})))
            .unwrap();

        assert_eq!(id.key, "1");
        assert_eq!(id.value, json!(1));
    }

    #[test]
    fn test_string_identifier() {
        let id = Identity::field("slug")
            .extract("Post", &record(json!({"slug": "hello"})))
            .unwrap();

        assert_eq!(id.key, "hello");
        assert_eq!(id.value, json!("hello"));
    }

    #[test]
    fn test_integral_float_shares_integer_key() {
        let identity = Identity::default();

        let int = identity.extract("User", &record(json!({"id": 1}))).unwrap();
        let float = identity.extract("User", &record(json!({"id": 1.0}))).unwrap();
        assert_eq!(int.key, "1");
        assert_eq!(float.key, "1");
        assert_eq!(float.value, json!(1.0));

        let negative = identity.extract("User", &record(json!({"id": -3.0}))).unwrap();
        assert_eq!(negative.key, "-3");

        let large = identity.extract("User", &record(json!({"id": 1.0e19}))).unwrap();
        assert_eq!(large.key, "10000000000000000000");

        let fractional = identity.extract("User", &record(json!({"id": 1.5}))).unwrap();
        assert_eq!(fractional.key, "1.5");
    }

    #[test]
    fn test_derived_identifier() {
        fn composite(record: &Map<String, Value>) -> Option<Value> {
            let a = record.get("a")?.as_i64()?;
            let b = record.get("b")?.as_i64()?;
            Some(Value::String(format!("{a}:{b}")))
        }

        let identity = Identity::Derived(composite);
        let id = identity
            .extract("Edge", &record(json!({"a": 1, "b": 2})))
            .unwrap();
        assert_eq!(id.key, "1:2");

        let err = identity.extract("Edge", &record(json!({"a": 1}))).unwrap_err();
        assert!(matches!(err, Error::MissingIdentifier { .. }));
    }

    #[test]
    fn test_missing_or_unusable_identifier() {
        let identity = Identity::default();

        for data in [json!({}), json!({"id": null}), json!({"id": [1]}), json!({"id": true})] {
            let err = identity.extract("User", &record(data)).unwrap_err();
            assert!(matches!(err, Error::MissingIdentifier { ref entity, .. } if entity == "User"));
        }
    }
}
