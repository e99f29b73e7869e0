//! The per-entity condition tree.
//!
//! A tree holds the active conditions of one entity in activation order, one
//! lazily created child per touched relationship, and an optional raw scope.
//! It is a builder-like value: owned by one caller, mutated freely, and
//! compiled with [`ConditionTree::sanitize`] as often as needed.
//!
//! # Example
//!
//! ```
//! use mik_search::prelude::*;
//! use std::sync::Arc;
//!
//! let schema = StaticSchema::new()
//!     .entity(
//!         EntityDef::new("Account")
//!             .column("id", SemanticType::Integer)
//!             .relationship("users", "User"),
//!     )
//!     .entity(EntityDef::new("User").column("first_name", SemanticType::Text));
//! let catalog = Arc::new(Catalog::from_schema(Registry::standard()?, schema)?);
//!
//! let mut conditions = catalog.conditions("Account")?;
//! conditions.set("id_gt", 5)?;
//! conditions.relation("users")?.set("first_name_like", "Ben")?;
//!
//! let fragment = conditions.sanitize();
//! assert_eq!(
//!     fragment.template,
//!     "(\"accounts\".\"id\" > ?) AND ((\"users\".\"first_name\" LIKE ?))"
//! );
//! assert_eq!(fragment.binds, vec![Value::Int(5), Value::from("%Ben%")]);
//! assert_eq!(conditions.includes(), vec![Include::new("users")]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod apply;

use crate::catalog::Catalog;
use crate::error::ConditionError;
use crate::params::Params;
use crate::sanitize::{Fragment, sanitize};
use crate::value::Value;
use crate::vocabulary::{ConditionKey, Vocabulary};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// A relationship to join, with the relationships to join beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    /// Relationship name.
    pub name: String,
    /// Non-empty relationships of the related entity.
    pub nested: Vec<Include>,
}

impl Include {
    /// A relationship with nothing nested.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nested: Vec::new(),
        }
    }

    /// Add nested includes.
    #[must_use]
    pub fn with(mut self, nested: Vec<Self>) -> Self {
        self.nested = nested;
        self
    }
}

/// Mutable condition state for one entity.
#[derive(Clone)]
pub struct ConditionTree {
    catalog: Arc<Catalog>,
    vocabulary: Arc<Vocabulary>,
    /// Active conditions in activation order.
    conditions: Vec<(ConditionKey, Value)>,
    /// Materialized relationships in first-access order.
    relations: Vec<(String, ConditionTree)>,
    scope: Option<String>,
    protected: bool,
}

impl ConditionTree {
    pub(crate) const fn new(
        catalog: Arc<Catalog>,
        vocabulary: Arc<Vocabulary>,
        protected: bool,
    ) -> Self {
        Self {
            catalog,
            vocabulary,
            conditions: Vec::new(),
            relations: Vec::new(),
            scope: None,
            protected,
        }
    }

    /// Entity this tree filters.
    #[must_use]
    pub fn entity(&self) -> &str {
        self.vocabulary.entity()
    }

    /// Whether bulk assignment is treated as untrusted.
    #[must_use]
    pub const fn is_protected(&self) -> bool {
        self.protected
    }

    /// Change the protected flag of this node. Existing children keep their
    /// flag; children created afterwards inherit the new one.
    pub fn set_protected(&mut self, protected: bool) {
        self.protected = protected;
    }

    /// Current value of a condition, `None` when unset.
    pub fn get(&self, name: &str) -> Result<Option<&Value>, ConditionError> {
        let key = self.resolve(name)?;
        Ok(self
            .conditions
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v))
    }

    /// Assign a condition, overwriting any previous value.
    ///
    /// [`Value::Null`] unsets the condition. Other values are coerced for the
    /// resolved kind; on failure nothing changes.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), ConditionError> {
        let key = self.resolve(name)?;
        self.assign(key, value.into())
    }

    /// Unset a condition, or drop a relationship's whole subtree.
    pub fn reset(&mut self, name: &str) -> Result<(), ConditionError> {
        if self.vocabulary.relationship(name).is_some() {
            self.relations.retain(|(n, _)| n != name);
            return Ok(());
        }
        let key = self.resolve(name)?;
        self.unset(&key);
        Ok(())
    }

    /// Unset every condition, drop every relationship and the scope.
    pub fn reset_all(&mut self) {
        self.conditions.clear();
        self.relations.clear();
        self.scope = None;
    }

    /// The child tree of a relationship, created on first access.
    pub fn relation(&mut self, name: &str) -> Result<&mut Self, ConditionError> {
        if !self.relations.iter().any(|(n, _)| n == name) {
            let target = self
                .vocabulary
                .relationship(name)
                .ok_or_else(|| self.unknown(name))?;
            let vocabulary = Arc::clone(self.catalog.vocabulary(&target.entity)?);
            let child = Self::new(Arc::clone(&self.catalog), vocabulary, self.protected);
            self.relations.push((name.to_string(), child));
        }

        let entity = self.vocabulary.entity();
        self.relations
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, child)| child)
            .ok_or_else(|| ConditionError::UnknownCondition {
                entity: entity.to_string(),
                name: name.to_string(),
            })
    }

    /// The child tree of a relationship, if it was materialized.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.relations
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, child)| child)
    }

    /// The raw scope, if set.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Set the raw scope, a complete boolean SQL expression ANDed in last.
    ///
    /// Refused on protected trees. An empty scope unsets it; a scope with a
    /// `?` placeholder is invalid since the scope carries no binds.
    pub fn set_scope(&mut self, scope: impl Into<String>) -> Result<(), ConditionError> {
        if self.protected {
            return Err(self.injection_risk());
        }
        let scope = scope.into();
        if scope.trim().is_empty() {
            self.scope = None;
            return Ok(());
        }
        if scope.contains('?') {
            return Err(ConditionError::invalid(
                "scope",
                "raw scopes cannot contain `?` placeholders",
            ));
        }
        self.scope = Some(scope);
        Ok(())
    }

    /// Remove the raw scope.
    pub fn clear_scope(&mut self) {
        self.scope = None;
    }

    /// Active conditions in activation order.
    pub fn conditions(&self) -> impl Iterator<Item = (&ConditionKey, &Value)> {
        self.conditions.iter().map(|(k, v)| (k, v))
    }

    /// Materialized relationships in first-access order, empty ones included.
    pub fn relations(&self) -> impl Iterator<Item = (&str, &Self)> {
        self.relations.iter().map(|(n, t)| (n.as_str(), t))
    }

    /// Current structured assignment: canonical names in activation order,
    /// then one nested mapping per non-empty relationship.
    #[must_use]
    pub fn value(&self) -> Params {
        let own = self
            .conditions
            .iter()
            .map(|(k, v)| (k.name().to_string(), Params::Value(v.clone())));
        let children = self
            .relations
            .iter()
            .filter(|(_, child)| !child.is_empty())
            .map(|(n, child)| (n.clone(), child.value()));
        Params::Map(own.chain(children).collect())
    }

    /// Relationships that must be joined, nested like the tree.
    #[must_use]
    pub fn includes(&self) -> Vec<Include> {
        self.relations
            .iter()
            .filter(|(_, child)| !child.is_empty())
            .map(|(n, child)| Include::new(n.clone()).with(child.includes()))
            .collect()
    }

    /// Number of clauses this node contributes: conditions, non-empty
    /// relationships and the scope.
    #[must_use]
    pub fn len(&self) -> usize {
        self.conditions.len()
            + self.relations.iter().filter(|(_, c)| !c.is_empty()).count()
            + usize::from(self.scope.is_some())
    }

    /// Whether the tree compiles to nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
            && self.scope.is_none()
            && self.relations.iter().all(|(_, c)| c.is_empty())
    }

    /// Canonical names of every condition this entity accepts, modifier
    /// chains aside.
    #[must_use]
    pub fn condition_names(&self) -> Vec<&str> {
        self.vocabulary.canonical_names().collect()
    }

    /// Relationship names of this entity, in schema order.
    #[must_use]
    pub fn relationship_names(&self) -> Vec<&str> {
        self.vocabulary
            .relationships()
            .iter()
            .map(|r| r.name.as_str())
            .collect()
    }

    /// Compile to a parameterized fragment.
    pub fn sanitize(&self) -> Fragment {
        sanitize(self)
    }

    fn resolve(&self, name: &str) -> Result<ConditionKey, ConditionError> {
        self.vocabulary
            .resolve(name)
            .ok_or_else(|| self.unknown(name))
    }

    fn assign(&mut self, key: ConditionKey, value: Value) -> Result<(), ConditionError> {
        if value.is_null() {
            self.unset(&key);
            return Ok(());
        }

        let value = key
            .kind()
            .coerce(key.value_type(), value, self.catalog.schema())
            .map_err(|reason| ConditionError::invalid(key.name(), reason))?;

        match self.conditions.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.conditions.push((key, value)),
        }
        Ok(())
    }

    fn unset(&mut self, key: &ConditionKey) {
        self.conditions.retain(|(k, _)| k != key);
    }

    fn unknown(&self, name: &str) -> ConditionError {
        ConditionError::UnknownCondition {
            entity: self.entity().to_string(),
            name: name.to_string(),
        }
    }

    fn injection_risk(&self) -> ConditionError {
        warn!(entity = %self.entity(), "raw SQL scope rejected on protected conditions");
        ConditionError::InjectionRisk {
            entity: self.entity().to_string(),
        }
    }
}

impl fmt::Debug for ConditionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let conditions: Vec<(&str, &Value)> =
            self.conditions.iter().map(|(k, v)| (k.name(), v)).collect();
        f.debug_struct("ConditionTree")
            .field("entity", &self.entity())
            .field("conditions", &conditions)
            .field("relations", &self.relations)
            .field("scope", &self.scope)
            .field("protected", &self.protected)
            .finish()
    }
}
