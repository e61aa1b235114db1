//! Typesync Schema
//!
//! Reconciles a declared content-type model against a backend schema store.
//!
//! # Overview
//!
//! Application code declares content types ([`ContentTypeDefinition`]) with
//! their properties and allowed child types. The engine looks each one up in
//! a [`SchemaStore`] by alias and creates or updates it so the persisted
//! schema matches the declaration:
//!
//! - [`TypeMappingRegistry`] picks the storage data-type definition for each
//!   property from its UI hint and declared type.
//! - [`ValueConverterRegistry`] turns stored raw values back into typed values.
//! - [`ContentTypeSynchronizer`] runs the two-pass reconciliation for one kind.
//! - [`SyncCoordinator`] runs the whole thing once per process at startup.
//!
//! # Example
//!
//! ```
//! use typesync_schema::{
//!     ContentKind, ContentTypeDefinition, ContentTypeSynchronizer, DeclaredType,
//!     MemorySchemaStore, PropertyDefinition, SchemaStore, TypeMappingRegistry,
//! };
//!
//! let article = ContentTypeDefinition::new("Article", "Article")
//!     .with_property(PropertyDefinition::new("Title", DeclaredType::string()));
//!
//! let mut store = MemorySchemaStore::new();
//! let mappings = TypeMappingRegistry::with_defaults();
//! let report = ContentTypeSynchronizer::new(&mut store, &mappings, ContentKind::Document)
//!     .synchronize(&[article], &ContentKind::Document)
//!     .unwrap();
//!
//! assert_eq!(report.created, vec!["article"]);
//! assert!(store.get_content_type(ContentKind::Document, "article").unwrap().is_some());
//! ```

pub mod alias;
pub mod config;
pub mod convert;
pub mod definition;
pub mod error;
pub mod manifest;
pub mod mapping;
pub mod memory;
pub mod model;
pub mod startup;
pub mod store;
pub mod sync;

pub use alias::to_alias;
pub use config::{load_config, ConfigError, SyncSettings, TypesyncConfig};
pub use convert::{default_converters, TypedValue, ValueConverter, ValueConverterRegistry};
pub use definition::{
    ContentKind, ContentTypeDefinition, DeclaredType, PropertyDefinition, TypeRef, ValueType,
};
pub use error::SyncError;
pub use manifest::{load_manifest, ManifestError};
pub use mapping::{
    default_type_mappings, DataTypeCatalog, DataTypeDefinition, DataTypeId, DataTypeMapping,
    HintMapping, MappingError, StorageType, TypeMappingRegistry,
};
pub use memory::MemorySchemaStore;
pub use model::{DeclaredModel, KindClassifier, ModelProvider};
pub use startup::{coordinator, synchronize_all, RunReport, SyncCoordinator};
pub use store::{BackendContentType, ContentTypeId, ContentTypeSort, PropertyType, SchemaStore, StoreError};
pub use sync::{ContentTypeSynchronizer, FailurePolicy, SyncFailure, SyncReport};
