//! The process-wide set of condition kinds and modifiers.
//!
//! A [`Registry`] is assembled once through [`RegistryBuilder`] and is
//! immutable afterwards. Every catalog and condition tree built from it shares
//! the same read-only view, so lookups need no synchronization.

use crate::error::ConfigurationError;
use crate::kind::{ConditionKind, KindRegistry, builtin_kinds};
use crate::modifier::{Modifier, ModifierRegistry, builtin_modifiers};
use std::sync::Arc;
use tracing::debug;

/// Condition kinds and modifiers, frozen after [`RegistryBuilder::build`].
#[derive(Debug, Clone)]
pub struct Registry {
    kinds: KindRegistry,
    modifiers: ModifierRegistry,
}

impl Registry {
    /// Start an empty registration phase.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The built-in kinds and modifiers.
    pub fn standard() -> Result<Self, ConfigurationError> {
        Self::builder().with_builtins().build()
    }

    /// Registered condition kinds.
    #[must_use]
    pub const fn kinds(&self) -> &KindRegistry {
        &self.kinds
    }

    /// Registered modifiers.
    #[must_use]
    pub const fn modifiers(&self) -> &ModifierRegistry {
        &self.modifiers
    }
}

/// Collects kinds and modifiers; validation happens in [`build`](Self::build).
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    builtins: bool,
    kinds: Vec<Arc<dyn ConditionKind>>,
    modifiers: Vec<Arc<dyn Modifier>>,
}

impl RegistryBuilder {
    /// Include the built-in kinds and modifiers, ahead of any custom ones.
    #[must_use]
    pub const fn with_builtins(mut self) -> Self {
        self.builtins = true;
        self
    }

    /// Append a condition kind. Kinds resolve in the order they are added.
    #[must_use]
    pub fn kind(mut self, kind: impl ConditionKind + 'static) -> Self {
        self.kinds.push(Arc::new(kind));
        self
    }

    /// Append a modifier.
    #[must_use]
    pub fn modifier(mut self, modifier: impl Modifier + 'static) -> Self {
        self.modifiers.push(Arc::new(modifier));
        self
    }

    /// Validate and freeze the registry.
    ///
    /// Fails on duplicate kind or modifier names, on a suffix shared by kinds
    /// with overlapping column types, and on a modifier token that is also a
    /// kind suffix (the name `x_not_in` could then be split two ways).
    pub fn build(self) -> Result<Registry, ConfigurationError> {
        let (mut kinds, mut modifiers) = if self.builtins {
            (builtin_kinds(), builtin_modifiers())
        } else {
            (Vec::new(), Vec::new())
        };
        kinds.extend(self.kinds);
        modifiers.extend(self.modifiers);

        let mut kind_registry = KindRegistry::new();
        for kind in kinds {
            kind_registry.register(kind)?;
        }

        let mut modifier_registry = ModifierRegistry::new();
        for modifier in modifiers {
            modifier_registry.register(modifier)?;
        }

        let mut tokens: Vec<&'static str> = modifier_registry.tokens().collect();
        tokens.sort_unstable();
        if let Some(token) = tokens.into_iter().find(|t| kind_registry.claims_suffix(t)) {
            return Err(ConfigurationError::ModifierShadowsKind {
                name: token.to_string(),
            });
        }

        debug!(
            kinds = kind_registry.len(),
            modifiers = modifier_registry.len(),
            "condition registry built"
        );

        Ok(Registry {
            kinds: kind_registry,
            modifiers: modifier_registry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::EQUALS;
    use crate::modifier::SqlFunction;
    use crate::schema::SemanticType;

    #[test]
    fn test_standard_registry() {
        let registry = Registry::standard().unwrap();
        assert_eq!(registry.kinds().len(), 16);
        assert_eq!(registry.modifiers().len(), 16);
        assert_eq!(
            registry
                .kinds()
                .resolve_suffix("gt", SemanticType::Integer)
                .unwrap()
                .name(),
            "greater_than"
        );
    }

    #[test]
    fn test_empty_builder() {
        let registry = Registry::builder().build().unwrap();
        assert!(registry.kinds().is_empty());
        assert!(registry.modifiers().is_empty());
    }

    #[test]
    fn test_custom_kind_after_builtins_is_rejected_when_duplicate() {
        let err = Registry::builder()
            .with_builtins()
            .kind(EQUALS)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DuplicateKind {
                name: "equals".into()
            }
        );
    }

    #[test]
    fn test_modifier_shadowing_kind_suffix() {
        let err = Registry::builder()
            .with_builtins()
            .modifier(SqlFunction::text("negate", &["not"], "NOT"))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::ModifierShadowsKind { name: "not".into() }
        );
    }
}
