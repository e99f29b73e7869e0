//! Schema-bound catalog: one validated vocabulary and protection policy per
//! entity, and the factory for condition trees.
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
//!             .column("name", SemanticType::Text)
//!             .protected(&["name_equals"]),
//!     );
//!
//! let catalog = Arc::new(Catalog::from_schema(Registry::standard()?, schema)?);
//! let mut conditions = catalog.conditions("Account")?;
//! conditions.set("name_like", "Binary")?;
//! assert_eq!(conditions.sanitize().template, "(\"accounts\".\"name\" LIKE ?)");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::error::{ConditionError, ConfigurationError};
use crate::protect::ProtectionPolicy;
use crate::registry::Registry;
use crate::schema::{SchemaAdapter, StaticSchema};
use crate::tree::ConditionTree;
use crate::vocabulary::Vocabulary;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Validated per-entity vocabularies over one registry and schema.
///
/// Build once at startup and share as `Arc<Catalog>`; trees keep a handle to
/// it so relationships can be materialized lazily.
pub struct Catalog {
    schema: Arc<dyn SchemaAdapter>,
    vocabularies: HashMap<String, Arc<Vocabulary>>,
}

impl Catalog {
    /// Start configuring a catalog.
    pub fn builder(
        registry: impl Into<Arc<Registry>>,
        schema: impl SchemaAdapter + 'static,
    ) -> CatalogBuilder {
        CatalogBuilder {
            registry: registry.into(),
            schema: Arc::new(schema),
            policies: BTreeMap::new(),
        }
    }

    /// Build from a [`StaticSchema`], taking protection lists from its entity
    /// definitions.
    pub fn from_schema(
        registry: impl Into<Arc<Registry>>,
        schema: StaticSchema,
    ) -> Result<Self, ConfigurationError> {
        let policies = schema
            .definitions()
            .iter()
            .map(|def| {
                let lists = PolicyLists {
                    accessible: def.accessible.clone(),
                    protected: def.protected.clone(),
                };
                (def.name.clone(), lists)
            })
            .collect();

        let mut builder = Self::builder(registry, schema);
        builder.policies = policies;
        builder.build()
    }

    /// Parse a TOML schema file and build from it.
    pub fn from_toml(
        registry: impl Into<Arc<Registry>>,
        source: &str,
    ) -> Result<Self, ConfigurationError> {
        Self::from_schema(registry, StaticSchema::from_toml(source)?)
    }

    /// A tree for trusted, internal use: every name may be set and raw scopes
    /// are accepted.
    pub fn conditions(self: &Arc<Self>, entity: &str) -> Result<ConditionTree, ConditionError> {
        self.tree(entity, false)
    }

    /// A tree for untrusted input: bulk assignment honours the entity's
    /// protection policy and rejects raw scopes.
    pub fn protected_conditions(
        self: &Arc<Self>,
        entity: &str,
    ) -> Result<ConditionTree, ConditionError> {
        self.tree(entity, true)
    }

    /// Every entity name, sorted.
    #[must_use]
    pub fn entities(&self) -> Vec<&str> {
        let mut entities: Vec<&str> = self.vocabularies.keys().map(String::as_str).collect();
        entities.sort_unstable();
        entities
    }

    /// The schema adapter the catalog was built from.
    #[must_use]
    pub fn schema(&self) -> &dyn SchemaAdapter {
        self.schema.as_ref()
    }

    pub(crate) fn vocabulary(&self, entity: &str) -> Result<&Arc<Vocabulary>, ConditionError> {
        self.vocabularies
            .get(entity)
            .ok_or_else(|| ConditionError::UnknownEntity {
                entity: entity.to_string(),
            })
    }

    fn tree(self: &Arc<Self>, entity: &str, protected: bool) -> Result<ConditionTree, ConditionError> {
        let vocabulary = Arc::clone(self.vocabulary(entity)?);
        Ok(ConditionTree::new(Arc::clone(self), vocabulary, protected))
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("entities", &self.entities())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct PolicyLists {
    accessible: Option<Vec<String>>,
    protected: Option<Vec<String>>,
}

/// Configures protection policies, then validates everything at once.
#[derive(Debug)]
pub struct CatalogBuilder {
    registry: Arc<Registry>,
    schema: Arc<dyn SchemaAdapter>,
    policies: BTreeMap<String, PolicyLists>,
}

impl CatalogBuilder {
    /// Only these names (conditions, aliases or relationships) of `entity`
    /// pass protected bulk assignment.
    #[must_use]
    pub fn accessible(mut self, entity: &str, names: &[&str]) -> Self {
        self.policies.entry(entity.to_string()).or_default().accessible = Some(owned_names(names));
        self
    }

    /// These names of `entity` are dropped from protected bulk assignment.
    #[must_use]
    pub fn protected(mut self, entity: &str, names: &[&str]) -> Self {
        self.policies.entry(entity.to_string()).or_default().protected = Some(owned_names(names));
        self
    }

    /// Build every entity vocabulary and resolve every policy.
    pub fn build(self) -> Result<Catalog, ConfigurationError> {
        let entities = self.schema.entities();
        let mut vocabularies = HashMap::with_capacity(entities.len());

        for entity in &entities {
            if vocabularies.contains_key(entity) {
                return Err(ConfigurationError::DuplicateEntity {
                    entity: entity.clone(),
                });
            }
            let vocabulary = Vocabulary::build(entity, &self.registry, self.schema.as_ref())?;
            if let Some(rel) = vocabulary
                .relationships()
                .iter()
                .find(|r| !entities.contains(&r.entity))
            {
                return Err(ConfigurationError::UnknownRelatedEntity {
                    entity: entity.clone(),
                    relationship: rel.name.clone(),
                    target: rel.entity.clone(),
                });
            }
            vocabularies.insert(entity.clone(), vocabulary);
        }

        for (entity, lists) in self.policies {
            if lists.accessible.is_none() && lists.protected.is_none() {
                continue;
            }
            let vocabulary = vocabularies
                .get_mut(&entity)
                .ok_or_else(|| ConfigurationError::UnknownEntity {
                    entity: entity.clone(),
                })?;

            let mut policy = ProtectionPolicy::open();
            if let Some(names) = &lists.accessible {
                policy = policy.accessible(canonicalize(vocabulary, names)?);
            }
            if let Some(names) = &lists.protected {
                policy = policy.protected(canonicalize(vocabulary, names)?);
            }
            debug!(%entity, ?policy, "protection policy configured");
            vocabulary.set_policy(policy);
        }

        let catalog = Catalog {
            schema: self.schema,
            vocabularies: vocabularies
                .into_iter()
                .map(|(entity, vocabulary)| (entity, Arc::new(vocabulary)))
                .collect(),
        };
        debug!(
            entities = catalog.vocabularies.len(),
            names = catalog
                .vocabularies
                .values()
                .map(|v| v.canonical_names().count())
                .sum::<usize>(),
            "condition catalog built"
        );
        Ok(catalog)
    }
}

fn owned_names(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

/// Map policy entries to canonical condition names; relationship names pass
/// through unchanged.
fn canonicalize(vocabulary: &Vocabulary, names: &[String]) -> Result<Vec<String>, ConfigurationError> {
    names
        .iter()
        .map(|name| {
            if vocabulary.relationship(name).is_some() {
                return Ok(name.clone());
            }
            vocabulary
                .resolve(name)
                .map(|key| key.name().to_string())
                .ok_or_else(|| ConfigurationError::UnknownProtectedName {
                    entity: vocabulary.entity().to_string(),
                    name: name.clone(),
                })
        })
        .collect()
}
