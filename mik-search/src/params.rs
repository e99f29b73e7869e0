//! Loosely-typed bulk input for [`ConditionTree::apply`](crate::ConditionTree::apply).
//!
//! A [`Params`] is either a single value or an ordered mapping of names to
//! nested params. Names are condition names (`name_contains`) or
//! relationship names (`users`), and a string where a mapping is expected is
//! a raw scope.
//!
//! # JSON
//!
//! ```
//! use mik_search::{Params, Value, parse_params};
//!
//! let params = parse_params(r#"{"id_gt": 5, "users": {"first_name_like": "Ben"}}"#).unwrap();
//! assert_eq!(params.get("id_gt"), Some(&Params::Value(Value::Int(5))));
//! ```
//!
//! JSON objects iterate in key order, so activation order after a JSON
//! `apply` is alphabetical.

use crate::value::Value;
use miniserde::json::{Number, Value as JsonValue};
use thiserror::Error;
use time::OffsetDateTime;

/// Error type for JSON params parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Invalid JSON syntax or encoding.
    #[error("invalid JSON syntax or encoding")]
    InvalidJson,
    /// Objects may only appear as mapping values, not inside arrays.
    #[error("objects are not allowed inside arrays")]
    ObjectInArray,
    /// An unsigned number does not fit in a signed 64-bit integer.
    #[error("number {0} is out of range")]
    NumberOutOfRange(u64),
}

/// Bulk assignment input.
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// A leaf value, or a raw scope string where a mapping is expected.
    Value(Value),
    /// Ordered `name -> params` pairs.
    Map(Vec<(String, Params)>),
}

impl Params {
    /// Build a mapping from pairs, keeping their order.
    pub fn map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Self>,
    {
        Self::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// An empty mapping.
    #[must_use]
    pub const fn empty() -> Self {
        Self::Map(Vec::new())
    }

    /// Whether this is an empty mapping or a null value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Value(v) => v.is_null(),
            Self::Map(pairs) => pairs.is_empty(),
        }
    }

    /// Look up a key of a mapping. The last pair wins on duplicates.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Map(pairs) => pairs.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v),
            Self::Value(_) => None,
        }
    }

    /// Parse params from a JSON string.
    pub fn parse(json_str: &str) -> Result<Self, ParseError> {
        let json: JsonValue =
            miniserde::json::from_str(json_str).map_err(|_| ParseError::InvalidJson)?;
        Self::from_json(&json)
    }

    /// Parse params from JSON bytes.
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self, ParseError> {
        let s = std::str::from_utf8(bytes).map_err(|_| ParseError::InvalidJson)?;
        Self::parse(s)
    }

    /// Convert an already parsed `miniserde` JSON value.
    pub fn from_json(json: &JsonValue) -> Result<Self, ParseError> {
        match json {
            JsonValue::Object(obj) => obj
                .iter()
                .map(|(k, v)| Ok((k.clone(), Self::from_json(v)?)))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Map),
            other => value_from_json(other).map(Self::Value),
        }
    }
}

/// Parse params from a JSON string.
///
/// Convenience for [`Params::parse`].
pub fn parse_params(json_str: &str) -> Result<Params, ParseError> {
    Params::parse(json_str)
}

fn value_from_json(json: &JsonValue) -> Result<Value, ParseError> {
    Ok(match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(Number::I64(i)) => Value::Int(*i),
        JsonValue::Number(Number::U64(u)) => {
            Value::Int(i64::try_from(*u).map_err(|_| ParseError::NumberOutOfRange(*u))?)
        },
        JsonValue::Number(Number::F64(f)) => Value::Float(*f),
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Array(items) => Value::Array(
            items
                .iter()
                .map(value_from_json)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        JsonValue::Object(_) => return Err(ParseError::ObjectInArray),
    })
}

impl From<Value> for Params {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

macro_rules! params_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Params {
                fn from(v: $ty) -> Self {
                    Self::Value(Value::from(v))
                }
            }
        )*
    };
}

params_from_value!(bool, i32, i64, f64, &str, String, OffsetDateTime);

impl<T: Into<Value>> From<Vec<T>> for Params {
    fn from(v: Vec<T>) -> Self {
        Self::Value(Value::from(v))
    }
}

impl<K: Into<String>, V: Into<Params>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::map(iter)
    }
}
