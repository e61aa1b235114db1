//! Reconciliation Engine
//!
//! Brings a backend schema in line with a batch of declared content types of
//! one kind. Two passes:
//!
//! 1. Per-type: look each definition up by alias, create or update it,
//!    reconcile its properties and save it.
//! 2. Allowed children: once every type in the batch exists, resolve each
//!    declared child reference by alias and replace the owner's
//!    allowed-children list.
//!
//! The free functions are stateless and take the factory and registry
//! explicitly. [`ContentTypeSynchronizer`] composes them for one kind.

use crate::definition::{ContentKind, ContentTypeDefinition, PropertyDefinition, TypeRef};
use crate::error::{Result, SyncError};
use crate::mapping::{DataTypeDefinition, TypeMappingRegistry};
use crate::model::KindClassifier;
use crate::store::{BackendContentType, ContentTypeSort, PropertyType, SchemaStore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// What a batch does when one content type fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop and return the error. Types already saved stay saved.
    #[default]
    Abort,
    /// Record the failure and move on to the next declared type.
    Continue,
}

/// A content type whose reconciliation failed under [`FailurePolicy::Continue`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub alias: String,
    pub message: String,
}

/// Outcome of one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub kind: ContentKind,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub failed: Vec<SyncFailure>,
    /// Owners whose allowed-children list was replaced
    pub children_assigned: Vec<String>,
    /// Existing properties bound to a different data type this run
    pub rebound_properties: usize,
}

impl SyncReport {
    pub fn new(kind: ContentKind) -> Self {
        Self {
            kind,
            created: Vec::new(),
            updated: Vec::new(),
            failed: Vec::new(),
            children_assigned: Vec::new(),
            rebound_properties: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Reject definitions missing required identity. Runs before any mutation.
pub fn validate_definition(definition: &ContentTypeDefinition) -> Result<()> {
    if definition.alias.trim().is_empty() {
        return Err(SyncError::InvalidArgument(format!(
            "content type '{}' has no alias",
            definition.type_name
        )));
    }

    for property in &definition.properties {
        if property.alias.trim().is_empty() {
            return Err(SyncError::InvalidArgument(format!(
                "property '{}' of content type '{}' has no alias",
                property.name, definition.alias
            )));
        }
    }

    for child in &definition.allowed_child_types {
        if child.type_name().trim().is_empty() {
            return Err(SyncError::InvalidArgument(format!(
                "content type '{}' allows a child type with no name",
                definition.alias
            )));
        }
    }

    Ok(())
}

/// Build a new backend content type from a definition.
///
/// Icon and thumbnail are copied only when declared; otherwise the factory's
/// defaults stay. The result is not saved.
pub fn create_content_type<F>(
    factory: F,
    definition: &ContentTypeDefinition,
    mappings: &TypeMappingRegistry,
) -> Result<BackendContentType>
where
    F: Fn() -> BackendContentType,
{
    validate_definition(definition)?;

    let mut content_type = factory();

    if let Some(id) = definition.id {
        content_type.key = id;
    }
    content_type.name = definition.name.clone();
    content_type.alias = definition.alias.clone();
    content_type.description = definition.description.clone();
    content_type.allowed_as_root = definition.allowed_as_root;

    if let Some(icon) = &definition.icon {
        content_type.icon = icon.clone();
    }
    if let Some(thumbnail) = &definition.thumbnail {
        content_type.thumbnail = thumbnail.clone();
    }

    create_property_types(&mut content_type, &definition.properties, mappings)?;

    Ok(content_type)
}

/// Overwrite an existing backend content type from a definition.
///
/// An undeclared icon or thumbnail resets to what `factory` produces.
/// Returns the number of properties rebound to a different data type.
pub fn update_content_type<F>(
    content_type: &mut BackendContentType,
    factory: F,
    definition: &ContentTypeDefinition,
    mappings: &TypeMappingRegistry,
) -> Result<usize>
where
    F: Fn() -> BackendContentType,
{
    validate_definition(definition)?;

    content_type.name = definition.name.clone();
    content_type.description = definition.description.clone();
    content_type.allowed_as_root = definition.allowed_as_root;

    let defaults = factory();
    content_type.icon = definition.icon.clone().unwrap_or(defaults.icon);
    content_type.thumbnail = definition.thumbnail.clone().unwrap_or(defaults.thumbnail);

    update_property_types(content_type, &definition.properties, mappings)
}

/// Add every declared property to the content type.
pub fn create_property_types(
    content_type: &mut BackendContentType,
    properties: &[PropertyDefinition],
    mappings: &TypeMappingRegistry,
) -> Result<()> {
    for property in properties {
        create_property_type(content_type, property, mappings)?;
    }
    Ok(())
}

/// Add one declared property, in its group if it declares one.
pub fn create_property_type(
    content_type: &mut BackendContentType,
    property: &PropertyDefinition,
    mappings: &TypeMappingRegistry,
) -> Result<()> {
    let data_type = resolve_data_type(content_type, property, mappings)?;

    let mut property_type = PropertyType::new(property.alias.clone(), data_type.id);
    property_type.name = property.name.clone();
    property_type.mandatory = property.mandatory;
    property_type.description = property.description.clone();
    property_type.validation_pattern = property.validation_pattern.clone();
    property_type.sort_order = property.sort_order;

    let added = match property.group() {
        Some(group) => content_type.add_property_type_to_group(property_type, group),
        None => content_type.add_property_type(property_type),
    };

    if added {
        debug!(
            "Added property {}.{} ({})",
            content_type.alias, property.alias, data_type.name
        );
    } else {
        warn!(
            "Property alias '{}' declared twice on content type '{}', keeping the first",
            property.alias, content_type.alias
        );
    }

    Ok(())
}

/// Create missing properties and update existing ones, matched by alias.
///
/// Persisted properties with no declared counterpart are left alone. A
/// repeated alias is ignored after its first declaration.
/// Returns the number of properties rebound to a different data type.
pub fn update_property_types(
    content_type: &mut BackendContentType,
    properties: &[PropertyDefinition],
    mappings: &TypeMappingRegistry,
) -> Result<usize> {
    let mut rebound = 0;
    let mut seen: HashSet<&str> = HashSet::new();

    for property in properties {
        if !seen.insert(property.alias.as_str()) {
            warn!(
                "Property alias '{}' declared twice on content type '{}', keeping the first",
                property.alias, content_type.alias
            );
            continue;
        }

        if content_type.has_property_type(&property.alias) {
            if update_property_type(content_type, property, mappings)? {
                rebound += 1;
            }
        } else {
            create_property_type(content_type, property, mappings)?;
        }
    }

    Ok(rebound)
}

/// Update an existing property in place. Returns true if its data type changed.
pub fn update_property_type(
    content_type: &mut BackendContentType,
    property: &PropertyDefinition,
    mappings: &TypeMappingRegistry,
) -> Result<bool> {
    let data_type = resolve_data_type(content_type, property, mappings)?;
    let group = property.group();

    if content_type.location_of(&property.alias) != Some(group) {
        debug!(
            "Moving property {}.{} to {}",
            content_type.alias,
            property.alias,
            group.unwrap_or("<ungrouped>")
        );
        content_type.move_property_type(&property.alias, group);
    }

    let owner = content_type.alias.clone();
    let Some(property_type) = content_type.property_type_mut(&property.alias) else {
        return Err(SyncError::InvalidArgument(format!(
            "property '{}' is not part of content type '{}'",
            property.alias, owner
        )));
    };

    property_type.name = property.name.clone();
    property_type.alias = property.alias.clone();
    property_type.mandatory = property.mandatory;
    property_type.description = property.description.clone();
    property_type.validation_pattern = property.validation_pattern.clone();
    if let Some(sort_order) = property.sort_order {
        property_type.sort_order = Some(sort_order);
    }
    debug!("Updated property {}.{}", owner, property.alias);

    if property_type.data_type_id != data_type.id {
        debug!(
            "Rebinding property {}.{} from {} to {}",
            owner, property.alias, property_type.data_type_id, data_type.id
        );
        property_type.data_type_id = data_type.id;
        return Ok(true);
    }

    Ok(false)
}

/// Resolve declared child references to stored types of `kind`.
///
/// References with no stored match are skipped. Each entry's sort order is
/// its position in the returned list.
pub fn resolve_allowed_children<S>(
    store: &S,
    kind: ContentKind,
    owner: &str,
    children: &[TypeRef],
) -> Result<Vec<ContentTypeSort>>
where
    S: SchemaStore + ?Sized,
{
    let mut allowed: Vec<ContentTypeSort> = Vec::with_capacity(children.len());

    for child in children {
        let alias = child.alias();
        let resolved = store.get_content_type(kind, &alias)?;

        match resolved.and_then(|ct| ct.id.map(|id| (id, ct.alias))) {
            Some((id, alias)) => allowed.push(ContentTypeSort {
                id,
                sort_order: allowed.len() as i32,
                alias,
            }),
            None => warn!(
                "Skipping allowed child type '{}' of {} type '{}': no {} type with alias '{}'",
                child.type_name(),
                kind,
                owner,
                kind,
                alias
            ),
        }
    }

    Ok(allowed)
}

/// Second pass: replace the allowed-children list of every definition that
/// declares children and save the owner.
///
/// `content_types` holds the backend types produced by the first pass.
/// Definitions without a backend counterpart there are skipped. Returns the
/// aliases of the owners that were saved.
pub fn set_allowed_content_types<S>(
    store: &mut S,
    classifier: &dyn KindClassifier,
    content_types: &mut [BackendContentType],
    definitions: &[ContentTypeDefinition],
) -> Result<Vec<String>>
where
    S: SchemaStore + ?Sized,
{
    let mut assigned = Vec::new();

    for definition in definitions
        .iter()
        .filter(|d| !d.allowed_child_types.is_empty())
    {
        let Some(content_type) = content_types
            .iter_mut()
            .find(|ct| ct.alias == definition.alias)
        else {
            continue;
        };

        let Some(kind) = classifier.kind_of(definition) else {
            warn!(
                "Content type '{}' belongs to no known kind, not saving allowed child types",
                definition.alias
            );
            continue;
        };

        let allowed = resolve_allowed_children(
            &*store,
            kind,
            &definition.alias,
            &definition.allowed_child_types,
        )?;
        debug!(
            "Allowing {} child types under {} type '{}'",
            allowed.len(),
            kind,
            definition.alias
        );
        content_type.set_allowed_content_types(allowed);
        store.save(kind, content_type)?;
        assigned.push(definition.alias.clone());
    }

    Ok(assigned)
}

fn resolve_data_type(
    content_type: &BackendContentType,
    property: &PropertyDefinition,
    mappings: &TypeMappingRegistry,
) -> Result<DataTypeDefinition> {
    mappings
        .resolve(property.ui_hint.as_deref(), &property.declared_type)
        .map_err(|source| SyncError::UnresolvedMapping {
            content_type: content_type.alias.clone(),
            property: property.alias.clone(),
            source,
        })
}

/// Reconciles one kind's batch of declared content types against a store.
///
/// Holds no state between calls; constructing a new one per run is cheap.
pub struct ContentTypeSynchronizer<'a, S: SchemaStore + ?Sized> {
    store: &'a mut S,
    mappings: &'a TypeMappingRegistry,
    kind: ContentKind,
    policy: FailurePolicy,
}

impl<'a, S: SchemaStore + ?Sized> ContentTypeSynchronizer<'a, S> {
    pub fn new(store: &'a mut S, mappings: &'a TypeMappingRegistry, kind: ContentKind) -> Self {
        Self {
            store,
            mappings,
            kind,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// Run both passes over `definitions`.
    pub fn synchronize(
        &mut self,
        definitions: &[ContentTypeDefinition],
        classifier: &dyn KindClassifier,
    ) -> Result<SyncReport> {
        let mut report = SyncReport::new(self.kind);
        let mut synchronized: Vec<BackendContentType> = Vec::with_capacity(definitions.len());
        let mut seen: HashSet<&str> = HashSet::new();

        let template = self.store.new_content_type(self.kind);
        let factory = || {
            let mut fresh = template.clone();
            fresh.key = uuid::Uuid::new_v4();
            fresh
        };

        for definition in definitions {
            if !seen.insert(definition.alias.as_str()) {
                warn!(
                    "Content type alias '{}' declared twice in the {} batch",
                    definition.alias, self.kind
                );
            }

            match self.synchronize_one(definition, &factory, &mut report) {
                Ok(content_type) => {
                    synchronized.retain(|ct| ct.alias != content_type.alias);
                    synchronized.push(content_type);
                }
                Err(err) => match self.policy {
                    FailurePolicy::Abort => return Err(err),
                    FailurePolicy::Continue => {
                        error!(
                            "Failed to synchronize {} type '{}': {}",
                            self.kind, definition.alias, err
                        );
                        report.failed.push(SyncFailure {
                            alias: definition.alias.clone(),
                            message: err.to_string(),
                        });
                    }
                },
            }
        }

        report.children_assigned =
            set_allowed_content_types(&mut *self.store, classifier, &mut synchronized, definitions)?;

        info!(
            "Synchronized {} types: {} created, {} updated, {} failed",
            self.kind,
            report.created.len(),
            report.updated.len(),
            report.failed.len()
        );

        Ok(report)
    }

    fn synchronize_one<F>(
        &mut self,
        definition: &ContentTypeDefinition,
        factory: &F,
        report: &mut SyncReport,
    ) -> Result<BackendContentType>
    where
        F: Fn() -> BackendContentType,
    {
        validate_definition(definition)?;

        match self.store.get_content_type(self.kind, &definition.alias)? {
            None => {
                info!("Creating {} type '{}'", self.kind, definition.alias);
                let mut content_type = create_content_type(factory, definition, self.mappings)?;
                self.store.save(self.kind, &mut content_type)?;
                report.created.push(definition.alias.clone());
                Ok(content_type)
            }
            Some(mut content_type) => {
                info!("Updating {} type '{}'", self.kind, definition.alias);
                let rebound =
                    update_content_type(&mut content_type, factory, definition, self.mappings)?;
                self.store.save(self.kind, &mut content_type)?;
                report.updated.push(definition.alias.clone());
                report.rebound_properties += rebound;
                Ok(content_type)
            }
        }
    }
}
