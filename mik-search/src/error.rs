//! Error types for condition assignment and catalog configuration.

use thiserror::Error;

/// Errors raised while assigning, resetting or reading conditions.
///
/// Keys dropped by a protection policy are *not* errors: bulk assignment
/// silently omits them. Everything here is a caller mistake or a rejected
/// unsafe input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConditionError {
    /// The name does not decompose into column + modifiers + condition kind,
    /// and is not a relationship of the entity.
    #[error("unknown condition `{name}` for `{entity}`")]
    UnknownCondition {
        /// Entity the lookup was made against.
        entity: String,
        /// The name as supplied by the caller.
        name: String,
    },
    /// The value could not be coerced for the resolved condition.
    #[error("invalid value for `{name}`: {reason}")]
    InvalidValue {
        /// Canonical condition name (or `scope` for raw fragments).
        name: String,
        /// Human-readable description of what was expected.
        reason: String,
    },
    /// A raw SQL scope was supplied through protected bulk assignment.
    #[error("raw SQL scope rejected for protected `{entity}` conditions")]
    InjectionRisk {
        /// Entity whose protected tree received the scope.
        entity: String,
    },
    /// The catalog has no entity with this name.
    #[error("unknown entity `{entity}`")]
    UnknownEntity {
        /// The requested entity name.
        entity: String,
    },
}

impl ConditionError {
    pub(crate) fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Errors detected while building a [`Registry`](crate::Registry) or a
/// [`Catalog`](crate::Catalog).
///
/// These are fatal at startup: a registry or catalog that fails to build is
/// never handed out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// Two condition kinds share a canonical name.
    #[error("condition kind `{name}` is registered twice")]
    DuplicateKind {
        /// The duplicated canonical name.
        name: String,
    },
    /// Two kinds applicable to the same semantic type answer to the same suffix.
    #[error("suffix `{suffix}` is claimed by both `{first}` and `{second}`")]
    AmbiguousAlias {
        /// The contested suffix.
        suffix: String,
        /// Kind registered first.
        first: String,
        /// Kind registered later.
        second: String,
    },
    /// Two modifiers share a name or alias.
    #[error("modifier name `{name}` is registered twice")]
    DuplicateModifier {
        /// The duplicated name.
        name: String,
    },
    /// A modifier token is also a condition kind token.
    #[error("modifier `{name}` shadows a condition kind of the same name")]
    ModifierShadowsKind {
        /// The shared token.
        name: String,
    },
    /// Two condition keys of one entity produce the same external name.
    #[error("`{entity}` condition name `{name}` is produced by both `{first}` and `{second}`")]
    AmbiguousName {
        /// Entity being defined.
        entity: String,
        /// The contested external name.
        name: String,
        /// Canonical key that claimed the name first.
        first: String,
        /// Key that claimed it second; `column + modifiers + kind` when the
        /// name decomposes through a modifier chain.
        second: String,
    },
    /// A relationship name clashes with a condition name.
    #[error("`{entity}` relationship `{name}` clashes with a condition of the same name")]
    RelationshipClash {
        /// Entity being defined.
        entity: String,
        /// The clashing name.
        name: String,
    },
    /// A table, column or relationship name is not a safe SQL identifier.
    #[error("`{entity}` has invalid identifier `{name}`")]
    InvalidIdentifier {
        /// Entity being defined.
        entity: String,
        /// The offending identifier.
        name: String,
    },
    /// The schema describes the same entity twice.
    #[error("entity `{entity}` is defined twice")]
    DuplicateEntity {
        /// The duplicated entity name.
        entity: String,
    },
    /// The schema adapter does not know an entity.
    #[error("unknown entity `{entity}`")]
    UnknownEntity {
        /// The missing entity.
        entity: String,
    },
    /// A relationship points to an entity the schema does not describe.
    #[error("`{entity}.{relationship}` points to unknown entity `{target}`")]
    UnknownRelatedEntity {
        /// Entity owning the relationship.
        entity: String,
        /// Relationship name.
        relationship: String,
        /// The missing target entity.
        target: String,
    },
    /// An accessible/protected list names something the entity does not have.
    #[error("`{entity}` protection list names unknown condition `{name}`")]
    UnknownProtectedName {
        /// Entity whose policy is being configured.
        entity: String,
        /// The unknown name.
        name: String,
    },
    /// The schema file could not be parsed.
    #[error("invalid schema file: {0}")]
    Toml(String),
}
