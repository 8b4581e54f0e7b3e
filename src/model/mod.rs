//! Entity metadata consumed by the translator.
//!
//! The host supplies a [`Model`] describing every queryable entity: its
//! table, its key attributes and, per property, the host type and the
//! store attribute name. Build one in code with [`Model::builder`] or load
//! it from TOML with [`Model::load_from_file`].

mod loader;
mod types;

pub use types::{AttributeType, HostType, TypeMapping, TypeMappingSource};

use crate::error::{QueryError, QueryResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A mapped entity property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(rename = "type")]
    pub host_type: HostType,
    /// Store attribute name, when it differs from `name`.
    #[serde(default)]
    pub attribute: Option<String>,
}

impl Property {
    pub fn new(name: impl Into<String>, host_type: HostType) -> Self {
        Self {
            name: name.into(),
            host_type,
            attribute: None,
        }
    }

    /// The attribute this property is stored under.
    pub fn attribute_name(&self) -> &str {
        self.attribute.as_deref().unwrap_or(&self.name)
    }

    pub fn type_mapping(&self) -> Option<TypeMapping> {
        TypeMappingSource.find_mapping(&self.host_type)
    }
}

/// A queryable entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    pub name: String,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub partition_key: Option<String>,
    #[serde(default)]
    pub sort_key: Option<String>,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            partition_key: None,
            sort_key: None,
            properties: Vec::new(),
        }
    }

    /// Create a new entity builder.
    pub fn builder(name: impl Into<String>) -> EntityTypeBuilder {
        EntityTypeBuilder {
            entity: EntityType::new(name),
        }
    }

    /// The table backing this entity; defaults to the entity name.
    pub fn table_name(&self) -> &str {
        self.table.as_deref().unwrap_or(&self.name)
    }

    pub fn find_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property(&self, name: &str) -> QueryResult<&Property> {
        self.find_property(name)
            .ok_or_else(|| QueryError::UnknownProperty {
                entity: self.name.clone(),
                property: name.to_string(),
            })
    }
}

/// Builder for [`EntityType`].
#[derive(Debug)]
pub struct EntityTypeBuilder {
    entity: EntityType,
}

impl EntityTypeBuilder {
    /// Map the entity to a table other than its own name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.entity.table = Some(table.into());
        self
    }

    pub fn partition_key(mut self, property: impl Into<String>) -> Self {
        self.entity.partition_key = Some(property.into());
        self
    }

    pub fn sort_key(mut self, property: impl Into<String>) -> Self {
        self.entity.sort_key = Some(property.into());
        self
    }

    /// Add a property stored under its own name.
    pub fn property(mut self, name: impl Into<String>, host_type: HostType) -> Self {
        self.entity.properties.push(Property::new(name, host_type));
        self
    }

    /// Add a property stored under a different attribute name.
    pub fn property_as(
        mut self,
        name: impl Into<String>,
        host_type: HostType,
        attribute: impl Into<String>,
    ) -> Self {
        let mut property = Property::new(name, host_type);
        property.attribute = Some(attribute.into());
        self.entity.properties.push(property);
        self
    }

    pub fn build(self) -> EntityType {
        self.entity
    }
}

/// All entity metadata for one translation pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    #[serde(default)]
    pub entities: Vec<EntityType>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new model builder.
    pub fn builder() -> ModelBuilder {
        ModelBuilder::default()
    }

    pub fn add_entity(&mut self, entity: EntityType) {
        self.entities.push(entity);
    }

    pub fn find_entity(&self, name: &str) -> Option<&EntityType> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn entity(&self, name: &str) -> QueryResult<&EntityType> {
        self.find_entity(name)
            .ok_or_else(|| QueryError::UnknownEntity(name.to_string()))
    }

    /// Check the model for inconsistencies the translator can't recover from.
    pub fn validate(&self) -> QueryResult<()> {
        let mut entity_names = HashSet::new();
        for entity in &self.entities {
            if !entity_names.insert(entity.name.as_str()) {
                return Err(QueryError::Model(format!(
                    "Entity '{}' is declared more than once",
                    entity.name
                )));
            }

            if entity.table.as_deref().is_some_and(str::is_empty) {
                return Err(QueryError::Model(format!(
                    "Entity '{}' has an empty table name",
                    entity.name
                )));
            }

            let mut property_names = HashSet::new();
            for property in &entity.properties {
                if !property_names.insert(property.name.as_str()) {
                    return Err(QueryError::Model(format!(
                        "Property '{}' is declared more than once on '{}'",
                        property.name, entity.name
                    )));
                }
            }

            for (role, key) in [
                ("partition key", &entity.partition_key),
                ("sort key", &entity.sort_key),
            ] {
                let Some(key) = key else { continue };
                if entity.find_property(key).is_none() {
                    return Err(QueryError::Model(format!(
                        "The {} '{}' of '{}' is not a declared property",
                        role, key, entity.name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Builder for [`Model`].
#[derive(Debug, Default)]
pub struct ModelBuilder {
    model: Model,
}

impl ModelBuilder {
    pub fn entity(mut self, entity: EntityType) -> Self {
        self.model.add_entity(entity);
        self
    }

    /// Build and validate the model.
    pub fn build(self) -> QueryResult<Model> {
        self.model.validate()?;
        Ok(self.model)
    }
}
