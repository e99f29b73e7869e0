//! In-memory schema adapter, built in code or deserialized from TOML.

use super::{Column, Relationship, SchemaAdapter, SemanticType, default_table_name};
use crate::error::ConfigurationError;
use serde::Deserialize;

/// A fixed set of entity descriptions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticSchema {
    #[serde(default, rename = "entity")]
    entities: Vec<EntityDef>,
}

/// One entity of a [`StaticSchema`], with its optional protection lists.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityDef {
    /// Entity name.
    pub name: String,
    /// Backing table; defaults to [`default_table_name`] of `name`.
    #[serde(default)]
    pub table: Option<String>,
    /// Columns, in declaration order.
    #[serde(default, rename = "column")]
    pub columns: Vec<Column>,
    /// Relationships, in declaration order.
    #[serde(default, rename = "relationship")]
    pub relationships: Vec<Relationship>,
    /// Allow-list for protected bulk assignment.
    #[serde(default)]
    pub accessible: Option<Vec<String>>,
    /// Deny-list for protected bulk assignment.
    #[serde(default)]
    pub protected: Option<Vec<String>>,
}

impl EntityDef {
    /// Start describing an entity.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            columns: Vec::new(),
            relationships: Vec::new(),
            accessible: None,
            protected: None,
        }
    }

    /// Override the backing table name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add a column.
    pub fn column(mut self, name: impl Into<String>, semantic_type: SemanticType) -> Self {
        self.columns.push(Column::new(name, semantic_type));
        self
    }

    /// Add a relationship to another entity.
    pub fn relationship(mut self, name: impl Into<String>, entity: impl Into<String>) -> Self {
        self.relationships.push(Relationship::new(name, entity));
        self
    }

    /// Only these conditions pass protected bulk assignment.
    pub fn accessible(mut self, names: &[&str]) -> Self {
        self.accessible = Some(names.iter().map(|s| (*s).to_string()).collect());
        self
    }

    /// These conditions are dropped from protected bulk assignment.
    pub fn protected(mut self, names: &[&str]) -> Self {
        self.protected = Some(names.iter().map(|s| (*s).to_string()).collect());
        self
    }

    fn resolved_table(&self) -> String {
        self.table
            .clone()
            .unwrap_or_else(|| default_table_name(&self.name))
    }
}

impl StaticSchema {
    /// An empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity. A later definition with the same name replaces the earlier one.
    #[must_use]
    pub fn entity(mut self, def: EntityDef) -> Self {
        self.entities.retain(|e| e.name != def.name);
        self.entities.push(def);
        self
    }

    /// Parse a schema file. Each entity may be defined once.
    pub fn from_toml(source: &str) -> Result<Self, ConfigurationError> {
        let schema: Self =
            toml::from_str(source).map_err(|e| ConfigurationError::Toml(e.to_string()))?;
        for (i, def) in schema.entities.iter().enumerate() {
            if schema.entities.iter().take(i).any(|e| e.name == def.name) {
                return Err(ConfigurationError::DuplicateEntity {
                    entity: def.name.clone(),
                });
            }
        }
        Ok(schema)
    }

    /// All entity definitions, in declaration order.
    #[must_use]
    pub fn definitions(&self) -> &[EntityDef] {
        &self.entities
    }

    fn find(&self, entity: &str) -> Option<&EntityDef> {
        self.entities.iter().find(|e| e.name == entity)
    }
}

impl SchemaAdapter for StaticSchema {
    fn entities(&self) -> Vec<String> {
        self.entities.iter().map(|e| e.name.clone()).collect()
    }

    fn table_name(&self, entity: &str) -> Option<String> {
        self.find(entity).map(EntityDef::resolved_table)
    }

    fn columns(&self, entity: &str) -> Option<Vec<Column>> {
        self.find(entity).map(|e| e.columns.clone())
    }

    fn relationships(&self, entity: &str) -> Option<Vec<Relationship>> {
        self.find(entity).map(|e| e.relationships.clone())
    }
}
