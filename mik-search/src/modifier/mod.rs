//! Value modifiers: column transformations placed between the column name and
//! the condition kind (`name_downcase_contains`, `created_at_year_gt`).
//!
//! A modifier wraps the column reference (`LOWER("users"."name")`), may
//! transform the assigned value to match, and may change the semantic type
//! the condition kind sees (`year` turns a temporal column into an integer).

mod builtin;

pub use builtin::{DatePart, SqlFunction, builtin_modifiers};

use crate::error::ConfigurationError;
use crate::schema::SemanticType;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A value/column transformation.
pub trait Modifier: Send + Sync + fmt::Debug {
    /// Canonical token, e.g. `lower`.
    fn name(&self) -> &'static str;

    /// Alternative tokens, e.g. `downcase`.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Whether the modifier accepts an input of this type.
    fn applies_to(&self, ty: SemanticType) -> bool;

    /// Type produced for a given input type.
    fn return_type(&self, input: SemanticType) -> SemanticType;

    /// Transform the assigned value before it is compiled.
    fn transform(&self, value: Value) -> Value {
        value
    }

    /// Wrap the column reference, if the modifier changes it.
    fn wrap_column(&self, _column_ref: &str) -> Option<String> {
        None
    }
}

/// Catalog of modifiers, addressable by name or alias.
#[derive(Debug, Clone, Default)]
pub struct ModifierRegistry {
    modifiers: Vec<Arc<dyn Modifier>>,
    by_token: HashMap<&'static str, usize>,
}

impl ModifierRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a modifier. Every token (name and aliases) must be unused.
    pub fn register(&mut self, modifier: Arc<dyn Modifier>) -> Result<(), ConfigurationError> {
        let tokens: Vec<&'static str> = std::iter::once(modifier.name())
            .chain(modifier.aliases().iter().copied())
            .collect();

        for (i, token) in tokens.iter().enumerate() {
            if self.by_token.contains_key(token) || tokens.iter().take(i).any(|t| t == token) {
                return Err(ConfigurationError::DuplicateModifier {
                    name: (*token).to_string(),
                });
            }
        }

        let idx = self.modifiers.len();
        for token in tokens {
            self.by_token.insert(token, idx);
        }
        self.modifiers.push(modifier);
        Ok(())
    }

    /// Look a modifier up by name or alias.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&Arc<dyn Modifier>> {
        self.by_token
            .get(name)
            .and_then(|&idx| self.modifiers.get(idx))
    }

    /// Every token (names and aliases).
    pub fn tokens(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_token.keys().copied()
    }

    /// Modifiers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Modifier>> {
        self.modifiers.iter()
    }

    /// Number of registered modifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    /// Whether no modifier is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }
}
