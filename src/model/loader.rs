//! Loading a [`Model`] from a TOML file.

use super::Model;
use crate::error::{QueryError, QueryResult};
use std::fs;
use std::path::Path;

impl Model {
    /// Parse and validate a model from TOML text.
    pub fn from_toml_str(content: &str) -> QueryResult<Self> {
        let model: Model = toml::from_str(content)
            .map_err(|e| QueryError::Model(format!("Failed to parse model: {}", e)))?;
        model.validate()?;
        Ok(model)
    }

    /// Load a model from a TOML file.
    pub fn load_from_file(path: impl AsRef<Path>) -> QueryResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let model = Self::from_toml_str(&content)?;

        for entity in &model.entities {
            tracing::debug!(
                "Loaded entity '{}' (table '{}', {} properties)",
                entity.name,
                entity.table_name(),
                entity.properties.len()
            );
        }
        tracing::info!("Loaded {} entities from {}", model.entities.len(), path.display());
        Ok(model)
    }
}
