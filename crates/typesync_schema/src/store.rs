//! Schema Store Contract
//!
//! The backend side of reconciliation. A store hands out live
//! [`BackendContentType`] values by alias, the engine mutates them in place,
//! and the store persists them again.

use crate::definition::ContentKind;
use crate::mapping::DataTypeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Errors a schema store can report. The engine never retries them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{kind} type '{alias}' already exists with id {existing}")]
    AliasConflict {
        kind: ContentKind,
        alias: String,
        existing: ContentTypeId,
    },

    #[error("{kind} type not found: {id}")]
    NotFound { kind: ContentKind, id: ContentTypeId },

    #[error("Backend rejected save: {0}")]
    Rejected(String),
}

/// Backend identifier of a persisted content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentTypeId(pub i32);

impl fmt::Display for ContentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyType {
    pub name: String,
    pub alias: String,
    pub data_type_id: DataTypeId,
    pub mandatory: bool,
    pub description: String,
    pub validation_pattern: Option<String>,
    /// `None` until the owning content type assigns a position
    pub sort_order: Option<i32>,
}

impl PropertyType {
    pub fn new(alias: impl Into<String>, data_type_id: DataTypeId) -> Self {
        let alias = alias.into();
        Self {
            name: alias.clone(),
            alias,
            data_type_id,
            mandatory: false,
            description: String::new(),
            validation_pattern: None,
            sort_order: None,
        }
    }
}

/// A named tab grouping persisted properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyGroup {
    pub name: String,
    pub sort_order: i32,
    pub property_types: Vec<PropertyType>,
}

impl PropertyGroup {
    pub fn contains(&self, alias: &str) -> bool {
        self.property_types.iter().any(|p| p.alias == alias)
    }
}

/// One entry in a content type's allowed-children list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeSort {
    pub id: ContentTypeId,
    pub sort_order: i32,
    pub alias: String,
}

/// The backend's live, mutable representation of a content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendContentType {
    /// Assigned by the store on first save
    pub id: Option<ContentTypeId>,
    pub key: Uuid,
    pub name: String,
    pub alias: String,
    pub description: String,
    pub allowed_as_root: bool,
    pub icon: String,
    pub thumbnail: String,
    property_types: Vec<PropertyType>,
    property_groups: Vec<PropertyGroup>,
    allowed_content_types: Vec<ContentTypeSort>,
}

impl BackendContentType {
    /// A fresh, unsaved content type carrying the kind's defaults.
    pub fn new(kind: ContentKind) -> Self {
        Self {
            id: None,
            key: Uuid::new_v4(),
            name: String::new(),
            alias: String::new(),
            description: String::new(),
            allowed_as_root: false,
            icon: kind.default_icon().to_string(),
            thumbnail: kind.default_thumbnail().to_string(),
            property_types: Vec::new(),
            property_groups: Vec::new(),
            allowed_content_types: Vec::new(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Properties outside any group.
    pub fn ungrouped_property_types(&self) -> &[PropertyType] {
        &self.property_types
    }

    pub fn property_groups(&self) -> &[PropertyGroup] {
        &self.property_groups
    }

    pub fn property_group(&self, name: &str) -> Option<&PropertyGroup> {
        self.property_groups.iter().find(|g| g.name == name)
    }

    /// Every property, ungrouped first, then group by group.
    pub fn property_types(&self) -> impl Iterator<Item = &PropertyType> {
        self.property_types
            .iter()
            .chain(self.property_groups.iter().flat_map(|g| g.property_types.iter()))
    }

    pub fn property_type(&self, alias: &str) -> Option<&PropertyType> {
        self.property_types().find(|p| p.alias == alias)
    }

    pub fn property_type_mut(&mut self, alias: &str) -> Option<&mut PropertyType> {
        if let Some(pos) = self.property_types.iter().position(|p| p.alias == alias) {
            return Some(&mut self.property_types[pos]);
        }
        self.property_groups
            .iter_mut()
            .flat_map(|g| g.property_types.iter_mut())
            .find(|p| p.alias == alias)
    }

    pub fn has_property_type(&self, alias: &str) -> bool {
        self.property_type(alias).is_some()
    }

    /// Where a property lives: `None` if absent, `Some(None)` if ungrouped,
    /// `Some(Some(group))` otherwise.
    pub fn location_of(&self, alias: &str) -> Option<Option<&str>> {
        if self.property_types.iter().any(|p| p.alias == alias) {
            return Some(None);
        }
        self.property_groups
            .iter()
            .find(|g| g.contains(alias))
            .map(|g| Some(g.name.as_str()))
    }

    /// Add a property outside any group. Returns false if the alias is taken.
    pub fn add_property_type(&mut self, property: PropertyType) -> bool {
        if self.has_property_type(&property.alias) {
            return false;
        }
        let property = assign_sort_order(property, self.property_types.len());
        self.property_types.push(property);
        true
    }

    /// Add a property to the named group, creating the group if needed.
    /// Returns false if the alias is taken.
    pub fn add_property_type_to_group(&mut self, property: PropertyType, group: &str) -> bool {
        if self.has_property_type(&property.alias) {
            return false;
        }
        let group = self.group_mut_or_insert(group);
        let property = assign_sort_order(property, group.property_types.len());
        group.property_types.push(property);
        true
    }

    /// Move a property to the named group (created if missing), or out of
    /// any group when `group` is `None`. Returns false if the alias is absent.
    pub fn move_property_type(&mut self, alias: &str, group: Option<&str>) -> bool {
        let Some(property) = self.take_property_type(alias) else {
            return false;
        };
        match group {
            Some(name) => self.group_mut_or_insert(name).property_types.push(property),
            None => self.property_types.push(property),
        }
        true
    }

    pub fn allowed_content_types(&self) -> &[ContentTypeSort] {
        &self.allowed_content_types
    }

    /// Replace the complete allowed-children list.
    pub fn set_allowed_content_types(&mut self, allowed: Vec<ContentTypeSort>) {
        self.allowed_content_types = allowed;
    }

    fn take_property_type(&mut self, alias: &str) -> Option<PropertyType> {
        if let Some(pos) = self.property_types.iter().position(|p| p.alias == alias) {
            return Some(self.property_types.remove(pos));
        }
        for group in &mut self.property_groups {
            if let Some(pos) = group.property_types.iter().position(|p| p.alias == alias) {
                return Some(group.property_types.remove(pos));
            }
        }
        None
    }

    fn group_mut_or_insert(&mut self, name: &str) -> &mut PropertyGroup {
        let pos = match self.property_groups.iter().position(|g| g.name == name) {
            Some(pos) => pos,
            None => {
                self.property_groups.push(PropertyGroup {
                    name: name.to_string(),
                    sort_order: self.property_groups.len() as i32,
                    property_types: Vec::new(),
                });
                self.property_groups.len() - 1
            }
        };
        &mut self.property_groups[pos]
    }
}

fn assign_sort_order(mut property: PropertyType, position: usize) -> PropertyType {
    if property.sort_order.is_none() {
        property.sort_order = Some(position as i32);
    }
    property
}

/// The external schema store the engine reconciles against.
///
/// Calls are synchronous; durability is the store's concern.
pub trait SchemaStore {
    /// Look up a content type of `kind` by alias.
    fn get_content_type(
        &self,
        kind: ContentKind,
        alias: &str,
    ) -> Result<Option<BackendContentType>, StoreError>;

    /// Construct a new, unsaved content type of `kind` with backend defaults.
    fn new_content_type(&self, kind: ContentKind) -> BackendContentType {
        BackendContentType::new(kind)
    }

    /// Persist a content type, assigning its id if it is new.
    fn save(&mut self, kind: ContentKind, content_type: &mut BackendContentType)
        -> Result<(), StoreError>;

    /// All stored content types of `kind`.
    fn content_types(&self, kind: ContentKind) -> Result<Vec<BackendContentType>, StoreError>;
}
