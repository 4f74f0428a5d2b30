// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Index Configuration Registry
//!
//! Immutable map from collection name to [`IndexConfig`], with a reverse
//! lookup from physical index name. Built once at startup and shared behind
//! an `Arc`; there is no mutation API.
//!
//! ```rust
//! use search_gateway::registry::IndexRegistry;
//!
//! let registry = IndexRegistry::standard();
//! let posts = registry.config("Posts").unwrap();
//! assert_eq!(registry.config_for_index("posts").unwrap(), posts);
//! assert!(registry.config("Nope").is_err());
//! ```

mod collections;
mod index_config;

use std::collections::HashMap;

use thiserror::Error;

pub use crate::search::{Ranking, Scoring};
pub use collections::standard_configs;
pub use index_config::{exact_field, strip_boost, IndexConfig, MappingKind, DEFAULT_KARMA_FIELD};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Config not found for: {name}")]
    ConfigNotFound { name: String },
    #[error("Collection '{collection}' has no searchable fields")]
    NoFields { collection: String },
    #[error("Duplicate collection or index name: {name}")]
    Duplicate { name: String },
    #[error("No indexes requested")]
    NoIndexes,
}

/// Read-only collection/index lookup table
#[derive(Debug, Clone, Default)]
pub struct IndexRegistry {
    configs: HashMap<String, IndexConfig>,
    /// index name -> collection name
    by_index: HashMap<String, String>,
}

impl IndexRegistry {
    /// Build a registry, rejecting configs without fields and name clashes
    pub fn from_configs(configs: impl IntoIterator<Item = IndexConfig>) -> Result<Self, ConfigError> {
        let mut registry = Self::default();
        for config in configs {
            if config.fields.is_empty() {
                return Err(ConfigError::NoFields {
                    collection: config.collection,
                });
            }
            if registry.configs.contains_key(&config.collection) {
                return Err(ConfigError::Duplicate { name: config.collection });
            }
            if registry.by_index.contains_key(&config.index) {
                return Err(ConfigError::Duplicate { name: config.index });
            }
            registry.by_index.insert(config.index.clone(), config.collection.clone());
            registry.configs.insert(config.collection.clone(), config);
        }
        Ok(registry)
    }

    /// Registry over the built-in collection table
    pub fn standard() -> Self {
        let mut registry = Self::default();
        for config in standard_configs() {
            registry.by_index.insert(config.index.clone(), config.collection.clone());
            registry.configs.insert(config.collection.clone(), config);
        }
        registry
    }

    /// Config for a collection name (e.g. "Posts")
    pub fn config(&self, collection: &str) -> Result<&IndexConfig, ConfigError> {
        self.configs.get(collection).ok_or_else(|| ConfigError::ConfigNotFound {
            name: collection.to_string(),
        })
    }

    /// Collection name for a physical index name (e.g. "posts")
    pub fn collection_for_index(&self, index: &str) -> Result<&str, ConfigError> {
        self.by_index
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::ConfigNotFound {
                name: index.to_string(),
            })
    }

    /// Config for a physical index name
    pub fn config_for_index(&self, index: &str) -> Result<&IndexConfig, ConfigError> {
        let collection = self.collection_for_index(index)?;
        self.config(collection)
    }

    /// Collection names, sorted
    pub fn collections(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.configs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
