//! Condition values and the coercion rules applied when a value is assigned.

use crate::schema::{SchemaAdapter, SemanticType};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// A condition value, and the bind parameter type of compiled fragments.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value. Assigning it unsets the condition.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// String value.
    String(String),
    /// Point in time; strings assigned to temporal columns parse into this.
    Timestamp(OffsetDateTime),
    /// Ordered sequence, used by set kinds (`IN`) and `between`.
    Array(Vec<Value>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the string payload, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Timestamp(_) => "timestamp",
            Self::Array(_) => "array",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<OffsetDateTime> for Value {
    fn from(v: OffsetDateTime) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Coerce a scalar to the given semantic type.
///
/// Strings are accepted for every type because bulk input usually arrives as
/// text. Temporal strings go through the schema adapter's parser; a parse
/// failure is an error, never a silent null.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::float_cmp)]
pub(crate) fn coerce_scalar(
    ty: SemanticType,
    value: Value,
    schema: &dyn SchemaAdapter,
) -> Result<Value, String> {
    let mismatch = |v: &Value| format!("expected {}, got {}", ty.as_str(), v.type_name());

    match (ty, value) {
        (_, v @ (Value::Null | Value::Array(_))) => Err(mismatch(&v)),

        (SemanticType::Text | SemanticType::Binary, v @ Value::String(_)) => Ok(v),
        (SemanticType::Text, Value::Int(i)) => Ok(Value::String(i.to_string())),
        (SemanticType::Text, Value::Float(f)) => Ok(Value::String(f.to_string())),
        (SemanticType::Text, Value::Bool(b)) => Ok(Value::String(b.to_string())),
        (SemanticType::Text, Value::Timestamp(ts)) => ts
            .format(&Rfc3339)
            .map(Value::String)
            .map_err(|e| e.to_string()),

        (SemanticType::Integer, v @ Value::Int(_)) => Ok(v),
        (SemanticType::Integer, Value::Float(f))
            if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 =>
        {
            Ok(Value::Int(f as i64))
        },
        (SemanticType::Integer, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| format!("`{s}` is not an integer")),

        (SemanticType::Float, v @ Value::Float(_)) => Ok(v),
        (SemanticType::Float, Value::Int(i)) => Ok(Value::Float(i as f64)),
        (SemanticType::Float, Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(Value::Float(f)),
            _ => Err(format!("`{s}` is not a number")),
        },

        (SemanticType::Boolean, v @ Value::Bool(_)) => Ok(v),
        (SemanticType::Boolean, Value::Int(0)) => Ok(Value::Bool(false)),
        (SemanticType::Boolean, Value::Int(1)) => Ok(Value::Bool(true)),
        (SemanticType::Boolean, Value::String(s)) => parse_flag(&s)
            .map(Value::Bool)
            .ok_or_else(|| format!("`{s}` is not a boolean")),

        (SemanticType::Temporal, v @ Value::Timestamp(_)) => Ok(v),
        (SemanticType::Temporal, Value::Int(secs)) => OffsetDateTime::from_unix_timestamp(secs)
            .map(Value::Timestamp)
            .map_err(|e| e.to_string()),
        (SemanticType::Temporal, Value::String(s)) => schema
            .parse_temporal(s.trim())
            .map(Value::Timestamp)
            .ok_or_else(|| format!("`{s}` is not a recognised date or time")),

        (_, v) => Err(mismatch(&v)),
    }
}

/// Coerce a value to a boolean flag (`true`, `"1"`, `"false"`, `0`, ...).
pub(crate) fn coerce_flag(value: Value) -> Result<Value, String> {
    match value {
        v @ Value::Bool(_) => Ok(v),
        Value::Int(0) => Ok(Value::Bool(false)),
        Value::Int(1) => Ok(Value::Bool(true)),
        Value::String(s) => parse_flag(&s)
            .map(Value::Bool)
            .ok_or_else(|| format!("`{s}` is not a boolean")),
        other => Err(format!("expected boolean, got {}", other.type_name())),
    }
}

/// Coerce any ordered sequence of scalars; a lone scalar becomes a one-element set.
pub(crate) fn coerce_set(
    ty: SemanticType,
    value: Value,
    schema: &dyn SchemaAdapter,
) -> Result<Value, String> {
    let items = match value {
        Value::Array(items) => items,
        scalar => vec![scalar],
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Array(_) => Err("nested arrays are not allowed".to_string()),
            scalar => coerce_scalar(ty, scalar, schema),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" => Some(true),
        "false" | "f" | "0" | "no" => Some(false),
        _ => None,
    }
}
