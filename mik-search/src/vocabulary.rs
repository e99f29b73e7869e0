//! Per-entity condition vocabulary: external name -> condition key.
//!
//! Every `column x applicable kind` pair is enumerated once when the catalog
//! is built, with all of its aliases, and collisions are rejected there.
//! Names carrying a modifier chain (`name_downcase_contains`) are unbounded,
//! so they are decomposed on lookup instead:
//!
//! 1. an exact enumerated name wins; building the vocabulary rejects any
//!    enumerated name that would also decompose, so this never hides a
//!    modifier chain;
//! 2. otherwise columns are tried in schema order, and for each column whose
//!    name prefixes the key, the remainder is split into
//!    `modifier chain + kind suffix`, longest modifier chain first;
//! 3. a modifier token may itself contain underscores (`day_of_month`); the
//!    longest token is tried first, and every modifier must accept the type
//!    produced by the previous one.

use crate::error::ConfigurationError;
use crate::kind::ConditionKind;
use crate::modifier::{Modifier, ModifierRegistry};
use crate::protect::ProtectionPolicy;
use crate::registry::Registry;
use crate::schema::{Column, Relationship, SchemaAdapter, SemanticType, is_valid_sql_identifier};
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// A resolved `(column, modifier chain, kind)` triple.
#[derive(Clone)]
pub struct ConditionKey {
    name: String,
    column: Column,
    column_ref: String,
    modifiers: Vec<Arc<dyn Modifier>>,
    kind: Arc<dyn ConditionKind>,
    value_type: SemanticType,
}

impl ConditionKey {
    /// Canonical external name, e.g. `created_at_greater_than`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying column.
    #[must_use]
    pub const fn column(&self) -> &Column {
        &self.column
    }

    /// Canonical name of the condition kind.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    /// Modifier names, innermost first.
    #[must_use]
    pub fn modifier_names(&self) -> Vec<&'static str> {
        self.modifiers.iter().map(|m| m.name()).collect()
    }

    /// Type seen by the condition kind, after the modifier chain.
    #[must_use]
    pub const fn value_type(&self) -> SemanticType {
        self.value_type
    }

    pub(crate) fn kind(&self) -> &dyn ConditionKind {
        self.kind.as_ref()
    }

    /// Run a value through the modifier chain.
    pub(crate) fn transform(&self, value: Value) -> Value {
        self.modifiers.iter().fold(value, |v, m| m.transform(v))
    }

    /// Quoted column reference with every modifier wrapped around it.
    pub(crate) fn wrapped_column(&self) -> String {
        self.modifiers
            .iter()
            .fold(self.column_ref.clone(), |column, m| {
                m.wrap_column(&column).unwrap_or(column)
            })
    }
}

impl PartialEq for ConditionKey {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ConditionKey {}

impl fmt::Debug for ConditionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionKey")
            .field("name", &self.name)
            .field("column", &self.column.name)
            .field("modifiers", &self.modifier_names())
            .field("kind", &self.kind.name())
            .finish()
    }
}

/// Everything a condition tree needs to know about one entity.
#[derive(Debug)]
pub(crate) struct Vocabulary {
    entity: String,
    table_ref: String,
    /// Columns with their quoted `"table"."column"` references.
    columns: Vec<(Column, String)>,
    relationships: Vec<Relationship>,
    keys: Vec<ConditionKey>,
    /// Canonical names and aliases -> index into `keys`.
    names: HashMap<String, usize>,
    policy: ProtectionPolicy,
    registry: Arc<Registry>,
}

impl Vocabulary {
    /// Enumerate an entity's names and check them for collisions.
    pub(crate) fn build(
        entity: &str,
        registry: &Arc<Registry>,
        schema: &dyn SchemaAdapter,
    ) -> Result<Self, ConfigurationError> {
        let invalid = |name: &str| ConfigurationError::InvalidIdentifier {
            entity: entity.to_string(),
            name: name.to_string(),
        };
        let unknown = || ConfigurationError::UnknownEntity {
            entity: entity.to_string(),
        };

        let table = schema.table_name(entity).ok_or_else(unknown)?;
        let columns = schema.columns(entity).ok_or_else(unknown)?;
        let relationships = schema.relationships(entity).unwrap_or_default();

        if !is_valid_sql_identifier(&table) {
            return Err(invalid(&table));
        }
        if let Some(bad) = columns
            .iter()
            .map(|c| c.name.as_str())
            .chain(relationships.iter().map(|r| r.name.as_str()))
            .find(|name| !is_valid_sql_identifier(name))
        {
            return Err(invalid(bad));
        }

        let mut vocabulary = Self {
            entity: entity.to_string(),
            table_ref: schema.quote_identifier(&table),
            columns: Vec::new(),
            relationships,
            keys: Vec::new(),
            names: HashMap::new(),
            policy: ProtectionPolicy::open(),
            registry: Arc::clone(registry),
        };

        for column in columns {
            let column_ref = format!(
                "{}.{}",
                vocabulary.table_ref,
                schema.quote_identifier(&column.name)
            );
            for kind in registry
                .kinds()
                .iter()
                .filter(|k| k.applies_to(column.semantic_type))
            {
                let key = ConditionKey {
                    name: kind.canonical_name_for(&column.name),
                    column: column.clone(),
                    column_ref: column_ref.clone(),
                    modifiers: Vec::new(),
                    kind: Arc::clone(kind),
                    value_type: column.semantic_type,
                };
                let aliases = kind.aliases_for(&column);
                vocabulary.insert(key, aliases)?;
            }
            vocabulary.columns.push((column, column_ref));
        }

        if let Some(clash) = vocabulary
            .relationships
            .iter()
            .find(|r| vocabulary.names.contains_key(&r.name))
        {
            return Err(ConfigurationError::RelationshipClash {
                entity: entity.to_string(),
                name: clash.name.clone(),
            });
        }

        vocabulary.check_modified_overlap()?;
        Ok(vocabulary)
    }

    /// Reject enumerated names that also decompose as `column + modifiers + kind`
    /// (columns `name` and `name_lower` both answer to `name_lower_contains`).
    fn check_modified_overlap(&self) -> Result<(), ConfigurationError> {
        let mut enumerated: Vec<(&String, usize)> =
            self.names.iter().map(|(name, &idx)| (name, idx)).collect();
        enumerated.sort_unstable();

        for (name, idx) in enumerated {
            let Some(shadow) = self.resolve_modified(name) else {
                continue;
            };
            let first = self
                .keys
                .get(idx)
                .map_or_else(String::new, |k| k.name.clone());
            let chain = std::iter::once(shadow.column.name.as_str())
                .chain(shadow.modifier_names())
                .chain(std::iter::once(shadow.kind_name()))
                .collect::<Vec<_>>()
                .join(" + ");
            return Err(ConfigurationError::AmbiguousName {
                entity: self.entity.clone(),
                name: name.clone(),
                first,
                second: chain,
            });
        }
        Ok(())
    }

    fn insert(&mut self, key: ConditionKey, aliases: Vec<String>) -> Result<(), ConfigurationError> {
        let idx = self.keys.len();
        for name in std::iter::once(key.name.clone()).chain(aliases) {
            if let Some(&other) = self.names.get(&name) {
                // A kind may list its canonical suffix among its aliases.
                if other == idx {
                    continue;
                }
                let first = self
                    .keys
                    .get(other)
                    .map_or_else(String::new, |k| k.name.clone());
                return Err(ConfigurationError::AmbiguousName {
                    entity: self.entity.clone(),
                    name,
                    first,
                    second: key.name.clone(),
                });
            }
            self.names.insert(name, idx);
        }
        self.keys.push(key);
        Ok(())
    }

    pub(crate) fn entity(&self) -> &str {
        &self.entity
    }

    pub(crate) const fn policy(&self) -> &ProtectionPolicy {
        &self.policy
    }

    pub(crate) fn set_policy(&mut self, policy: ProtectionPolicy) {
        self.policy = policy;
    }

    /// Target entity of a relationship.
    pub(crate) fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.name == name)
    }

    pub(crate) fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Canonical names of every enumerated key, in column then kind order.
    pub(crate) fn canonical_names(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|k| k.name.as_str())
    }

    /// Resolve an external name, including modifier-chain names.
    pub(crate) fn resolve(&self, name: &str) -> Option<ConditionKey> {
        if let Some(key) = self.names.get(name).and_then(|&idx| self.keys.get(idx)) {
            return Some(key.clone());
        }
        self.resolve_modified(name)
    }

    fn resolve_modified(&self, name: &str) -> Option<ConditionKey> {
        let modifiers = self.registry.modifiers();
        if modifiers.is_empty() {
            return None;
        }

        for (column, column_ref) in &self.columns {
            let Some(rest) = name
                .strip_prefix(column.name.as_str())
                .and_then(|r| r.strip_prefix('_'))
            else {
                continue;
            };

            let segments: Vec<&str> = rest.split('_').collect();
            // The chain needs at least one segment, the kind suffix at least one.
            for split in (1..segments.len()).rev() {
                let (chain, suffix) = segments.split_at(split);
                let Some((chain, value_type)) = parse_chain(modifiers, chain, column.semantic_type)
                else {
                    continue;
                };
                let suffix = suffix.join("_");
                let Some(kind) = self.registry.kinds().resolve_suffix(&suffix, value_type) else {
                    continue;
                };

                let modified = chain.iter().fold(column.name.clone(), |acc, m| {
                    format!("{acc}_{}", m.name())
                });
                let key = ConditionKey {
                    name: kind.canonical_name_for(&modified),
                    column: column.clone(),
                    column_ref: column_ref.clone(),
                    modifiers: chain,
                    kind: Arc::clone(kind),
                    value_type,
                };
                trace!(entity = %self.entity, name, canonical = %key.name, "resolved modified condition");
                return Some(key);
            }
        }
        None
    }
}

/// Decompose `segments` into a chain of modifiers starting from type `ty`.
fn parse_chain(
    modifiers: &ModifierRegistry,
    segments: &[&str],
    ty: SemanticType,
) -> Option<(Vec<Arc<dyn Modifier>>, SemanticType)> {
    if segments.is_empty() {
        return Some((Vec::new(), ty));
    }
    for take in (1..=segments.len()).rev() {
        let (head, tail) = segments.split_at(take);
        let Some(modifier) = modifiers.resolve(&head.join("_")) else {
            continue;
        };
        if !modifier.applies_to(ty) {
            continue;
        }
        if let Some((rest, out)) = parse_chain(modifiers, tail, modifier.return_type(ty)) {
            let mut chain = Vec::with_capacity(rest.len() + 1);
            chain.push(Arc::clone(modifier));
            chain.extend(rest);
            return Some((chain, out));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EntityDef, StaticSchema};

    fn schema() -> StaticSchema {
        StaticSchema::new()
            .entity(
                EntityDef::new("Order")
                    .column("id", SemanticType::Integer)
                    .column("name", SemanticType::Text)
                    .column("created_at", SemanticType::Temporal)
                    .relationship("user", "User"),
            )
            .entity(EntityDef::new("User").column("first_name", SemanticType::Text))
    }

    fn vocabulary() -> Vocabulary {
        let registry = Arc::new(Registry::standard().unwrap());
        Vocabulary::build("Order", &registry, &schema()).unwrap()
    }

    #[test]
    fn test_aliases_resolve_to_canonical() {
        let vocabulary = vocabulary();
        assert_eq!(vocabulary.resolve("id_gt").unwrap().name(), "id_greater_than");
        assert_eq!(vocabulary.resolve("name_like").unwrap().name(), "name_contains");
        assert_eq!(vocabulary.resolve("name").unwrap().name(), "name_equals");
        assert_eq!(
            vocabulary.resolve("created_after").unwrap().name(),
            "created_at_greater_than"
        );
        assert!(vocabulary.resolve("name_gt").is_none());
        assert!(vocabulary.resolve("user").is_none());
    }

    #[test]
    fn test_modifier_chain() {
        let vocabulary = vocabulary();
        let key = vocabulary.resolve("name_downcase_contains").unwrap();
        assert_eq!(key.name(), "name_lower_contains");
        assert_eq!(key.modifier_names(), vec!["lower"]);
        assert_eq!(key.wrapped_column(), "LOWER(\"orders\".\"name\")");

        let key = vocabulary.resolve("name_trim_lower_bw").unwrap();
        assert_eq!(key.name(), "name_trim_lower_begins_with");
        assert_eq!(
            key.wrapped_column(),
            "LOWER(TRIM(\"orders\".\"name\"))"
        );
    }

    #[test]
    fn test_modifier_changes_applicable_kinds() {
        let vocabulary = vocabulary();
        let key = vocabulary.resolve("created_at_year_gte").unwrap();
        assert_eq!(key.name(), "created_at_year_greater_than_or_equal_to");
        assert_eq!(key.value_type(), SemanticType::Integer);

        let key = vocabulary.resolve("created_at_day_of_month_equals").unwrap();
        assert_eq!(key.modifier_names(), vec!["day_of_month"]);

        // CHAR_LENGTH yields an integer; `contains` no longer applies.
        assert!(vocabulary.resolve("name_length_contains").is_none());
        assert!(vocabulary.resolve("name_length_gt").is_some());
        // `lower` does not apply to integers.
        assert!(vocabulary.resolve("id_lower_equals").is_none());
    }

    #[test]
    fn test_relationship_clash() {
        let schema = StaticSchema::new()
            .entity(
                EntityDef::new("Order")
                    .column("name", SemanticType::Text)
                    .relationship("name_like", "Order"),
            );
        let registry = Arc::new(Registry::standard().unwrap());
        let err = Vocabulary::build("Order", &registry, &schema).unwrap_err();
        assert!(matches!(err, ConfigurationError::RelationshipClash { .. }));
    }

    #[test]
    fn test_ambiguous_name() {
        // `name_not` is both `name` + does_not_equal and the bare `name_not` column.
        let schema = StaticSchema::new().entity(
            EntityDef::new("Order")
                .column("name", SemanticType::Text)
                .column("name_not", SemanticType::Text),
        );
        let registry = Arc::new(Registry::standard().unwrap());
        let err = Vocabulary::build("Order", &registry, &schema).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::AmbiguousName { ref name, .. } if name == "name_not"
        ));
    }

    #[test]
    fn test_column_shadowing_modifier_chain() {
        let schema = StaticSchema::new().entity(
            EntityDef::new("Account")
                .column("name", SemanticType::Text)
                .column("name_lower", SemanticType::Text),
        );
        let registry = Arc::new(Registry::standard().unwrap());
        let err = Vocabulary::build("Account", &registry, &schema).unwrap_err();
        let ConfigurationError::AmbiguousName { name, first, second, .. } = err else {
            panic!("expected AmbiguousName, got {err:?}");
        };
        assert!(name.starts_with("name_lower_"), "{name}");
        assert!(first.starts_with("name_lower_"), "{first}");
        assert!(second.starts_with("name + lower + "), "{second}");

        // `name_lower` is fine on its own; only the overlap is rejected.
        let schema = StaticSchema::new()
            .entity(EntityDef::new("Account").column("name_lower", SemanticType::Text));
        let vocabulary = Vocabulary::build("Account", &registry, &schema).unwrap();
        assert_eq!(
            vocabulary.resolve("name_lower_contains").unwrap().column().name,
            "name_lower"
        );
    }

    #[test]
    fn test_invalid_identifier() {
        let schema = StaticSchema::new().entity(
            EntityDef::new("Order")
                .table("orders; DROP TABLE users")
                .column("name", SemanticType::Text),
        );
        let registry = Arc::new(Registry::standard().unwrap());
        let err = Vocabulary::build("Order", &registry, &schema).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidIdentifier { .. }));
    }
}
