//! Typesync configuration
//!
//! Reads synchronization settings and registry extensions from
//! `~/.typesync/config.toml`. A missing file means defaults.

use crate::definition::{ContentKind, DeclaredType};
use crate::mapping::{DataTypeDefinition, NamedMapping, StorageType, TypeMappingRegistry};
use crate::sync::FailurePolicy;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Error type for config operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Mapping for '{declared_type}' names unknown data type '{data_type}'")]
    UnknownDataType {
        declared_type: String,
        data_type: String,
    },

    #[error("Invalid declared type in mapping: {0}")]
    InvalidType(String),
}

/// Result type for config operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Root of config.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TypesyncConfig {
    #[serde(default)]
    pub sync: SyncSettings,

    /// Extra storage data-type definitions for the catalog
    #[serde(default)]
    pub data_types: Vec<DataTypeConfig>,

    /// Extension type mappings, registered after the built-ins
    #[serde(default)]
    pub mappings: Vec<MappingConfig>,
}

/// Which kinds a startup run synchronizes, and what happens on failure
#[derive(Debug, Clone, Deserialize)]
pub struct SyncSettings {
    #[serde(default = "default_enabled")]
    pub document_types: bool,

    #[serde(default = "default_enabled")]
    pub media_types: bool,

    #[serde(default = "default_enabled")]
    pub member_types: bool,

    #[serde(default)]
    pub on_error: FailurePolicy,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            document_types: default_enabled(),
            media_types: default_enabled(),
            member_types: default_enabled(),
            on_error: FailurePolicy::default(),
        }
    }
}

impl SyncSettings {
    pub fn enabled(&self, kind: ContentKind) -> bool {
        match kind {
            ContentKind::Document => self.document_types,
            ContentKind::Media => self.media_types,
            ContentKind::Member => self.member_types,
        }
    }

    /// Enabled kinds in run order.
    pub fn kinds(&self) -> Vec<ContentKind> {
        ContentKind::ALL
            .into_iter()
            .filter(|kind| self.enabled(*kind))
            .collect()
    }
}

/// `[[data_types]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct DataTypeConfig {
    pub id: i32,
    pub name: String,
    pub editor: String,
    #[serde(default = "default_storage")]
    pub storage: StorageType,
}

/// `[[mappings]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct MappingConfig {
    /// Declared type string, e.g. `"i32?"` or `"Color"`
    #[serde(rename = "type")]
    pub declared_type: String,
    /// Catalog definition name
    pub data_type: String,
}

fn default_enabled() -> bool { true }
fn default_storage() -> StorageType { StorageType::Nvarchar }

impl TypesyncConfig {
    /// Build a mapping registry: built-ins first, then configured data types
    /// and mappings. Configured mappings win on key collision.
    pub fn type_mappings(&self) -> Result<TypeMappingRegistry> {
        let mut registry = TypeMappingRegistry::with_defaults();

        for data_type in &self.data_types {
            registry.register_data_type(DataTypeDefinition::new(
                data_type.id,
                data_type.name.clone(),
                data_type.editor.clone(),
                data_type.storage,
            ));
        }

        for mapping in &self.mappings {
            let declared: DeclaredType = mapping
                .declared_type
                .parse()
                .map_err(ConfigError::InvalidType)?;

            if registry.catalog().by_name(&mapping.data_type).is_none() {
                return Err(ConfigError::UnknownDataType {
                    declared_type: mapping.declared_type.clone(),
                    data_type: mapping.data_type.clone(),
                });
            }

            registry.register(declared, Arc::new(NamedMapping::new(mapping.data_type.clone())));
        }

        Ok(registry)
    }
}

/// Parse config from TOML text.
pub fn parse_config(content: &str) -> Result<TypesyncConfig> {
    Ok(toml::from_str(content)?)
}

/// Load config from a path. A missing file yields the defaults.
pub fn load_config(config_path: &Path) -> Result<TypesyncConfig> {
    if !config_path.exists() {
        return Ok(TypesyncConfig::default());
    }
    let content = std::fs::read_to_string(config_path)?;
    parse_config(&content)
}
