//! Schema adapter: the entity description the engine consumes.
//!
//! The engine never discovers a schema. It asks a [`SchemaAdapter`] for each
//! entity's table, columns (name + [`SemanticType`]) and relationships, and
//! uses it to quote identifiers and parse temporal input.
//!
//! [`StaticSchema`] is the bundled adapter, built in code or loaded from TOML:
//!
//! ```toml
//! [[entity]]
//! name = "Account"
//! accessible = ["name_contains", "users"]
//!
//! [[entity.column]]
//! name = "name"
//! type = "text"
//!
//! [[entity.relationship]]
//! name = "users"
//! entity = "User"
//! ```

mod ident;
mod static_schema;

pub use ident::{default_table_name, is_valid_sql_identifier, quote_ansi};
pub use static_schema::{EntityDef, StaticSchema};

use serde::Deserialize;
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// Semantic column type, the input to condition-kind applicability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    /// Character data.
    #[serde(alias = "string")]
    Text,
    /// Whole numbers.
    Integer,
    /// Floating point and decimal numbers.
    Float,
    /// True/false.
    Boolean,
    /// Dates, times and timestamps.
    #[serde(alias = "datetime", alias = "date", alias = "timestamp")]
    Temporal,
    /// Opaque bytes. Only null checks apply.
    Binary,
}

impl SemanticType {
    /// Every semantic type, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Text,
        Self::Integer,
        Self::Float,
        Self::Boolean,
        Self::Temporal,
        Self::Binary,
    ];

    /// Lowercase name as used in schema files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Temporal => "temporal",
            Self::Binary => "binary",
        }
    }

    /// Text columns.
    #[must_use]
    pub const fn is_textual(self) -> bool {
        matches!(self, Self::Text)
    }

    /// Integer or float columns.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    /// Temporal columns.
    #[must_use]
    pub const fn is_temporal(self) -> bool {
        matches!(self, Self::Temporal)
    }

    /// Numeric or temporal: the types that support ordering comparisons.
    #[must_use]
    pub const fn is_ordered(self) -> bool {
        self.is_numeric() || self.is_temporal()
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Column {
    /// Column name, unquoted.
    pub name: String,
    /// Type driving which condition kinds apply.
    #[serde(rename = "type")]
    pub semantic_type: SemanticType,
}

impl Column {
    /// Create a column description.
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
        }
    }
}

/// A named relationship to another entity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Relationship {
    /// Relationship name, as used in params.
    pub name: String,
    /// Related entity.
    pub entity: String,
}

impl Relationship {
    /// Create a relationship description.
    pub fn new(name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity: entity.into(),
        }
    }
}

/// Source of schema information for the engine.
///
/// Implementations are consulted once, when a [`Catalog`](crate::Catalog) is
/// built, except for [`quote_identifier`](Self::quote_identifier) (also used
/// at build time) and [`parse_temporal`](Self::parse_temporal), which runs
/// whenever a temporal condition receives a string.
pub trait SchemaAdapter: Send + Sync + fmt::Debug {
    /// Names of every entity this schema describes.
    fn entities(&self) -> Vec<String>;

    /// Table backing an entity, unquoted.
    fn table_name(&self, entity: &str) -> Option<String>;

    /// Columns of an entity, in declaration order.
    fn columns(&self, entity: &str) -> Option<Vec<Column>>;

    /// Relationships of an entity, in declaration order.
    fn relationships(&self, entity: &str) -> Option<Vec<Relationship>>;

    /// Quote an identifier for use in a fragment. ANSI double quotes by default.
    fn quote_identifier(&self, name: &str) -> String {
        quote_ansi(name)
    }

    /// Parse user-supplied temporal input.
    ///
    /// The default accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) and
    /// `YYYY-MM-DD` (midnight UTC).
    fn parse_temporal(&self, raw: &str) -> Option<OffsetDateTime> {
        if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
            return Some(ts);
        }
        if let Ok(ts) =
            PrimitiveDateTime::parse(raw, format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        {
            return Some(ts.assume_utc());
        }
        Date::parse(raw, format_description!("[year]-[month]-[day]"))
            .ok()
            .map(|d| d.midnight().assume_utc())
    }
}
