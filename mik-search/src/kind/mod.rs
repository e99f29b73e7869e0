//! Condition kinds: named comparison operators and their SQL rendering.
//!
//! A kind decides which semantic column types it applies to, which names it
//! answers to for a given column, how an assigned value is coerced, and what
//! fragment it compiles to. The [`KindRegistry`] keeps kinds in registration
//! order; that order is the resolution order.

mod builtin;

pub use builtin::{
    BEGINS_WITH, Between, CONTAINS, Comparison, DOES_NOT_CONTAIN, DOES_NOT_EQUAL, ENDS_WITH,
    EQUALS, GREATER_THAN, GREATER_THAN_OR_EQUAL_TO, IN, IS_NOT_NULL, IS_NULL, Keywords, LESS_THAN,
    LESS_THAN_OR_EQUAL_TO, NOT_IN, NullCheck, Pattern, SetMembership, builtin_kinds,
};

use crate::error::ConfigurationError;
use crate::schema::{Column, SchemaAdapter, SemanticType};
use crate::value::{Value, coerce_scalar};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A condition kind.
///
/// Only [`name`](Self::name), [`applies_to`](Self::applies_to) and
/// [`compile`](Self::compile) are required.
pub trait ConditionKind: Send + Sync + fmt::Debug {
    /// Canonical suffix, e.g. `greater_than`.
    fn name(&self) -> &'static str;

    /// Alternative suffixes, e.g. `gt`. Also accepted after a modifier chain.
    fn alias_suffixes(&self) -> &'static [&'static str] {
        &[]
    }

    /// Whether this kind can be applied to a column of this type.
    fn applies_to(&self, ty: SemanticType) -> bool;

    /// Canonical external name for a column (or `column_modifier` prefix).
    fn canonical_name_for(&self, column: &str) -> String {
        format!("{column}_{}", self.name())
    }

    /// Every accepted alias for a column, canonical name excluded.
    fn aliases_for(&self, column: &Column) -> Vec<String> {
        self.alias_suffixes()
            .iter()
            .map(|suffix| format!("{}_{suffix}", column.name))
            .collect()
    }

    /// Coerce an assigned value for a column whose (modified) type is `ty`.
    fn coerce(
        &self,
        ty: SemanticType,
        value: Value,
        schema: &dyn SchemaAdapter,
    ) -> Result<Value, String> {
        coerce_scalar(ty, value, schema)
    }

    /// Render the condition. Placeholders are `?`, one per returned bind.
    fn compile(&self, column_ref: &str, value: &Value) -> (String, Vec<Value>);
}

/// Ordered catalog of condition kinds.
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    kinds: Vec<Arc<dyn ConditionKind>>,
    /// Suffix (canonical or alias) -> kind indices, in registration order.
    by_suffix: HashMap<&'static str, Vec<usize>>,
}

impl KindRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a kind.
    ///
    /// Fails if the canonical name is taken, or if one of its suffixes is
    /// already claimed by an earlier kind that applies to an overlapping set
    /// of semantic types. Kinds with disjoint types may share suffixes; the
    /// earlier one is tried first.
    pub fn register(&mut self, kind: Arc<dyn ConditionKind>) -> Result<(), ConfigurationError> {
        if self.kinds.iter().any(|k| k.name() == kind.name()) {
            return Err(ConfigurationError::DuplicateKind {
                name: kind.name().to_string(),
            });
        }

        let suffixes = suffixes_of(kind.as_ref());
        for suffix in &suffixes {
            for &idx in self.by_suffix.get(suffix).into_iter().flatten() {
                let Some(earlier) = self.kinds.get(idx) else {
                    continue;
                };
                if overlaps(earlier.as_ref(), kind.as_ref()) {
                    return Err(ConfigurationError::AmbiguousAlias {
                        suffix: (*suffix).to_string(),
                        first: earlier.name().to_string(),
                        second: kind.name().to_string(),
                    });
                }
            }
        }

        let idx = self.kinds.len();
        for suffix in suffixes {
            self.by_suffix.entry(suffix).or_default().push(idx);
        }
        self.kinds.push(kind);
        Ok(())
    }

    /// Kinds in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ConditionKind>> {
        self.kinds.iter()
    }

    /// Number of registered kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Whether no kind is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Look a kind up by canonical name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ConditionKind>> {
        self.kinds.iter().find(|k| k.name() == name)
    }

    /// Find the first kind answering to `proposed_name` for `column`.
    ///
    /// Walks kinds in registration order, skipping those that do not apply to
    /// the column's type, and matches the canonical name and aliases.
    #[must_use]
    pub fn resolve(&self, column: &Column, proposed_name: &str) -> Option<&Arc<dyn ConditionKind>> {
        self.kinds
            .iter()
            .filter(|k| k.applies_to(column.semantic_type))
            .find(|k| {
                k.canonical_name_for(&column.name) == proposed_name
                    || k.aliases_for(column).iter().any(|a| a == proposed_name)
            })
    }

    /// Find the kind answering to a bare suffix for a value of type `ty`.
    ///
    /// Used after a modifier chain, where column-derived aliases do not apply.
    #[must_use]
    pub fn resolve_suffix(&self, suffix: &str, ty: SemanticType) -> Option<&Arc<dyn ConditionKind>> {
        self.by_suffix
            .get(suffix)?
            .iter()
            .filter_map(|&idx| self.kinds.get(idx))
            .find(|k| k.applies_to(ty))
    }

    /// Whether any kind claims this suffix.
    #[must_use]
    pub fn claims_suffix(&self, suffix: &str) -> bool {
        self.by_suffix.contains_key(suffix)
    }
}

fn suffixes_of(kind: &dyn ConditionKind) -> Vec<&'static str> {
    std::iter::once(kind.name())
        .chain(kind.alias_suffixes().iter().copied())
        .collect()
}

fn overlaps(a: &dyn ConditionKind, b: &dyn ConditionKind) -> bool {
    SemanticType::ALL
        .into_iter()
        .any(|ty| a.applies_to(ty) && b.applies_to(ty))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Matches;

    impl ConditionKind for Matches {
        fn name(&self) -> &'static str {
            "matches"
        }

        fn alias_suffixes(&self) -> &'static [&'static str] {
            &["like"]
        }

        fn applies_to(&self, ty: SemanticType) -> bool {
            ty == SemanticType::Binary
        }

        fn compile(&self, column_ref: &str, value: &Value) -> (String, Vec<Value>) {
            (format!("{column_ref} ~ ?"), vec![value.clone()])
        }
    }

    fn builtins() -> KindRegistry {
        let mut registry = KindRegistry::new();
        for kind in builtin_kinds() {
            registry.register(kind).unwrap();
        }
        registry
    }

    #[test]
    fn test_builtins_register_cleanly() {
        let registry = builtins();
        assert_eq!(registry.len(), 16);
        assert_eq!(registry.iter().next().unwrap().name(), "equals");
    }

    #[test]
    fn test_duplicate_canonical_name_rejected() {
        let mut registry = builtins();
        let err = registry.register(Arc::new(EQUALS)).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DuplicateKind {
                name: "equals".into()
            }
        );
    }

    #[test]
    fn test_overlapping_alias_rejected() {
        #[derive(Debug)]
        struct TextLike;
        impl ConditionKind for TextLike {
            fn name(&self) -> &'static str {
                "text_like"
            }
            fn alias_suffixes(&self) -> &'static [&'static str] {
                &["like"]
            }
            fn applies_to(&self, ty: SemanticType) -> bool {
                ty.is_textual()
            }
            fn compile(&self, column_ref: &str, value: &Value) -> (String, Vec<Value>) {
                (format!("{column_ref} LIKE ?"), vec![value.clone()])
            }
        }

        let mut registry = builtins();
        let err = registry.register(Arc::new(TextLike)).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::AmbiguousAlias { ref suffix, ref first, .. }
                if suffix == "like" && first == "contains"
        ));
    }

    #[test]
    fn test_disjoint_types_may_share_suffix() {
        let mut registry = builtins();
        registry.register(Arc::new(Matches)).unwrap();

        let text = Column::new("name", SemanticType::Text);
        let blob = Column::new("payload", SemanticType::Binary);

        assert_eq!(registry.resolve(&text, "name_like").unwrap().name(), "contains");
        assert_eq!(registry.resolve(&blob, "payload_like").unwrap().name(), "matches");
        assert_eq!(
            registry.resolve_suffix("like", SemanticType::Binary).unwrap().name(),
            "matches"
        );
    }

    #[test]
    fn test_canonical_names_resolve_to_their_kind() {
        let registry = builtins();
        for ty in SemanticType::ALL {
            let column = Column::new("field", ty);
            for kind in registry.iter().filter(|k| k.applies_to(ty)) {
                let name = kind.canonical_name_for(&column.name);
                let resolved = registry.resolve(&column, &name).unwrap();
                assert_eq!(resolved.name(), kind.name(), "{name} on {ty}");
            }
        }
    }

    #[test]
    fn test_resolve_respects_applicability() {
        let registry = builtins();
        let text = Column::new("name", SemanticType::Text);
        let id = Column::new("id", SemanticType::Integer);

        assert!(registry.resolve(&text, "name_gt").is_none());
        assert!(registry.resolve(&id, "id_contains").is_none());
        assert_eq!(registry.resolve(&id, "id_gt").unwrap().name(), "greater_than");
        assert_eq!(registry.resolve(&id, "id").unwrap().name(), "equals");
    }
}
