// =============================================================================
// CRATE-LEVEL QUALITY LINTS
// =============================================================================
#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]
#![warn(unreachable_pub)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
// =============================================================================
// CLIPPY CONFIGURATION
// =============================================================================
#![allow(clippy::doc_markdown)] // SQL and identifiers in docs
#![allow(clippy::missing_errors_doc)] // Error enums document every variant
#![allow(clippy::module_name_repetitions)] // ConditionKind in kind, etc.
#![allow(clippy::return_self_not_must_use)] // Builder methods
#![allow(clippy::must_use_candidate)] // Builder methods
#![allow(clippy::match_same_arms)] // Coercion tables read better unmerged

//! # mik-search - Schema-driven search conditions
//!
//! Turns loosely-typed search input (`{"name_contains": "Binary", "id_gt": 5}`)
//! into a parameterized SQL boolean expression and its bind values. Caller
//! data only ever reaches the binds; the template is built from schema
//! identifiers and condition-kind operators.
//!
//! ## Quick Start
//!
//! ```
//! # use mik_search::prelude::*;
//! # use std::sync::Arc;
//! let catalog = Arc::new(Catalog::from_toml(
//!     Registry::standard()?,
//!     r#"
//!     [[entity]]
//!     name = "Account"
//!
//!     [[entity.column]]
//!     name = "name"
//!     type = "text"
//!
//!     [[entity.column]]
//!     name = "id"
//!     type = "integer"
//!     "#,
//! )?);
//!
//! let mut conditions = catalog.protected_conditions("Account")?;
//! conditions.apply(parse_params(r#"{"name_contains": "Binary", "id_gt": 5}"#)?)?;
//!
//! let (template, binds) = conditions.sanitize().into_parts();
//! assert_eq!(template, "(\"accounts\".\"id\" > ?) AND (\"accounts\".\"name\" LIKE ?)");
//! assert_eq!(binds, vec![Value::Int(5), Value::from("%Binary%")]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Naming
//!
//! A condition name is `column[_modifier...]_kind`:
//!
//! | Name | SQL |
//! |------|-----|
//! | `name_contains`, `name_like` | `"t"."name" LIKE '%v%'` |
//! | `name`, `name_eq` | `"t"."name" = ?` |
//! | `id_gt`, `id_greater_than` | `"t"."id" > ?` |
//! | `created_after` (column `created_at`) | `"t"."created_at" > ?` |
//! | `id_in` | `"t"."id" IN (?)` |
//! | `name_downcase_bw` | `LOWER("t"."name") LIKE 'v%'` |
//! | `created_at_year_gte` | `EXTRACT(YEAR FROM "t"."created_at") >= ?` |
//!
//! Relationship names (`users`) take a nested mapping, applied to the related
//! entity's tree, and compile to one parenthesized group.
//!
//! ## Trust
//!
//! Use [`Catalog::protected_conditions`] for untrusted input. Its bulk
//! assignment honours the entity's accessible/protected lists and refuses raw
//! SQL scopes with [`ConditionError::InjectionRisk`]. Unknown names are always
//! errors.
//!
//! ## Modules
//!
//! - [`kind`] - condition kinds and their registry
//! - [`modifier`] - column/value modifiers and their registry
//! - [`schema`] - schema adapter trait and the TOML-backed [`StaticSchema`]

pub mod kind;
pub mod modifier;
pub mod schema;

mod catalog;
mod error;
mod params;
mod protect;
mod registry;
mod sanitize;
mod tree;
mod value;
mod vocabulary;

pub use catalog::{Catalog, CatalogBuilder};
pub use error::{ConditionError, ConfigurationError};
pub use kind::{ConditionKind, KindRegistry};
pub use modifier::{Modifier, ModifierRegistry};
pub use params::{ParseError, Params, parse_params};
pub use protect::ProtectionPolicy;
pub use registry::{Registry, RegistryBuilder};
pub use sanitize::{Fragment, sanitize};
pub use schema::{
    Column, EntityDef, Relationship, SchemaAdapter, SemanticType, StaticSchema,
    is_valid_sql_identifier,
};
pub use tree::{ConditionTree, Include};
pub use value::Value;
pub use vocabulary::ConditionKey;

/// Prelude module for convenient imports.
///
/// ```
/// use mik_search::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Catalog, ConditionError, ConditionTree, ConfigurationError, EntityDef, Fragment, Include,
        Params, Registry, SchemaAdapter, SemanticType, StaticSchema, Value, parse_params,
    };
}


// ============================================================================
// API Contract Tests (compile-time assertions)
// ============================================================================

#[cfg(test)]
mod api_contracts {
    use static_assertions::assert_impl_all;

    // Shared, read-only after construction.
    assert_impl_all!(crate::Registry: Send, Sync, Clone, std::fmt::Debug);
    assert_impl_all!(crate::Catalog: Send, Sync, std::fmt::Debug);

    // Trees are owned values that can move between threads.
    assert_impl_all!(crate::ConditionTree: Send, Sync, Clone, std::fmt::Debug);

    // Value is Clone, Debug, PartialEq (no Eq because of Float)
    assert_impl_all!(crate::Value: Clone, std::fmt::Debug, PartialEq);
    assert_impl_all!(crate::Params: Clone, std::fmt::Debug, PartialEq);
    assert_impl_all!(crate::Fragment: Clone, std::fmt::Debug, PartialEq, Default);
    assert_impl_all!(crate::Include: Clone, std::fmt::Debug, PartialEq, Eq);

    assert_impl_all!(crate::SemanticType: Copy, Clone, std::fmt::Debug, PartialEq, Eq);

    // Errors are std errors and comparable in tests.
    assert_impl_all!(crate::ConditionError: std::error::Error, Clone, PartialEq, Eq, Send, Sync);
    assert_impl_all!(crate::ConfigurationError: std::error::Error, Clone, PartialEq, Eq, Send, Sync);
    assert_impl_all!(crate::ParseError: std::error::Error, Clone, PartialEq, Eq);
}
