//! Type Mapping Registry
//!
//! Resolves a declared property's `(ui hint, declared type)` pair to the
//! storage data-type definition the backend binds it to.
//!
//! # Resolution order
//!
//! 1. A non-blank UI hint is offered to the default [`HintMapping`] first. It
//!    binds on the hint alone, so authors can force a specific editor
//!    regardless of the declared type.
//! 2. Otherwise (or if the hint mapping declines) the [`DataTypeMapping`]
//!    registered under the exact declared type is asked. A mapping may still
//!    decline after the key matched.
//! 3. Nothing matched: [`MappingError::NoMappingFound`].
//!
//! Registries are built once and read-only afterwards, so lookups need no
//! locking.

use crate::definition::{DeclaredType, ValueType};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors from type mapping resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("No data type definition for {declared_type}{}", hint_suffix(.ui_hint))]
    NoMappingFound {
        ui_hint: Option<String>,
        declared_type: DeclaredType,
    },
}

fn hint_suffix(ui_hint: &Option<String>) -> String {
    match ui_hint {
        Some(hint) => format!(" (UI hint '{}')", hint),
        None => String::new(),
    }
}

/// Backend identifier of a storage data-type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataTypeId(pub i32);

impl fmt::Display for DataTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Physical column type a data-type definition stores values in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    Integer,
    Date,
    Nvarchar,
    Ntext,
    Decimal,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Integer => "integer",
            StorageType::Date => "date",
            StorageType::Nvarchar => "nvarchar",
            StorageType::Ntext => "ntext",
            StorageType::Decimal => "decimal",
        }
    }
}

/// A backend storage data-type definition: how a property value is stored
/// and which editor edits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTypeDefinition {
    pub id: DataTypeId,
    pub name: String,
    pub editor_alias: String,
    pub storage: StorageType,
}

impl DataTypeDefinition {
    pub fn new(
        id: i32,
        name: impl Into<String>,
        editor_alias: impl Into<String>,
        storage: StorageType,
    ) -> Self {
        Self {
            id: DataTypeId(id),
            name: name.into(),
            editor_alias: editor_alias.into(),
            storage,
        }
    }
}

pub const BOOLEAN_DEFINITION: &str = "True/false";
pub const DATE_TIME_DEFINITION: &str = "Date Picker with time";
pub const DATE_DEFINITION: &str = "Date Picker";
pub const NUMERIC_DEFINITION: &str = "Numeric";
pub const TEXT_DEFINITION: &str = "Textstring";
pub const TEXTAREA_DEFINITION: &str = "Textarea";
pub const RICH_TEXT_DEFINITION: &str = "Richtext editor";

/// The data-type definitions the backend knows about.
#[derive(Debug, Clone, Default)]
pub struct DataTypeCatalog {
    definitions: Vec<DataTypeDefinition>,
}

impl DataTypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The definitions every backend ships with.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for definition in [
            DataTypeDefinition::new(-49, BOOLEAN_DEFINITION, "Umbraco.TrueFalse", StorageType::Integer),
            DataTypeDefinition::new(-36, DATE_TIME_DEFINITION, "Umbraco.DateTime", StorageType::Date),
            DataTypeDefinition::new(-41, DATE_DEFINITION, "Umbraco.Date", StorageType::Date),
            DataTypeDefinition::new(-51, NUMERIC_DEFINITION, "Umbraco.Integer", StorageType::Integer),
            DataTypeDefinition::new(-88, TEXT_DEFINITION, "Umbraco.Textbox", StorageType::Nvarchar),
            DataTypeDefinition::new(-89, TEXTAREA_DEFINITION, "Umbraco.TextboxMultiple", StorageType::Ntext),
            DataTypeDefinition::new(-87, RICH_TEXT_DEFINITION, "Umbraco.TinyMCEv3", StorageType::Ntext),
        ] {
            catalog.insert(definition);
        }
        catalog
    }

    /// Add a definition, replacing any existing one with the same id or name.
    pub fn insert(&mut self, definition: DataTypeDefinition) {
        self.definitions
            .retain(|d| d.id != definition.id && d.name != definition.name);
        self.definitions.push(definition);
    }

    pub fn by_id(&self, id: DataTypeId) -> Option<&DataTypeDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    pub fn by_name(&self, name: &str) -> Option<&DataTypeDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    pub fn by_editor_alias(&self, editor_alias: &str) -> Option<&DataTypeDefinition> {
        self.definitions.iter().find(|d| d.editor_alias == editor_alias)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataTypeDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Maps a declared type to a data-type definition.
///
/// Implement this to teach the registry about application types.
pub trait DataTypeMapping: Send + Sync {
    /// Whether this mapping still accepts `declared` after the key matched.
    fn can_map(&self, declared: &DeclaredType) -> bool;

    fn definition(
        &self,
        declared: &DeclaredType,
        catalog: &DataTypeCatalog,
    ) -> Option<DataTypeDefinition>;
}

/// Binds directly on a UI hint, ahead of the type-keyed mappings.
pub trait HintMapping: Send + Sync {
    fn can_map(&self, ui_hint: &str, declared: &DeclaredType, catalog: &DataTypeCatalog) -> bool;

    fn definition(
        &self,
        ui_hint: &str,
        declared: &DeclaredType,
        catalog: &DataTypeCatalog,
    ) -> Option<DataTypeDefinition>;
}

/// Default hint mapping: a hint names a catalog definition, by definition
/// name or by editor alias.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogHintMapping;

impl CatalogHintMapping {
    fn lookup<'a>(ui_hint: &str, catalog: &'a DataTypeCatalog) -> Option<&'a DataTypeDefinition> {
        catalog
            .by_name(ui_hint)
            .or_else(|| catalog.by_editor_alias(ui_hint))
    }
}

impl HintMapping for CatalogHintMapping {
    fn can_map(&self, ui_hint: &str, _declared: &DeclaredType, catalog: &DataTypeCatalog) -> bool {
        Self::lookup(ui_hint, catalog).is_some()
    }

    fn definition(
        &self,
        ui_hint: &str,
        _declared: &DeclaredType,
        catalog: &DataTypeCatalog,
    ) -> Option<DataTypeDefinition> {
        Self::lookup(ui_hint, catalog).cloned()
    }
}

const BOOLEAN_TYPES: &[ValueType] = &[ValueType::Bool];
const DATE_TIME_TYPES: &[ValueType] = &[ValueType::DateTime];
const FLOATING_BINARY_POINT_TYPES: &[ValueType] = &[ValueType::Float32, ValueType::Float64];
const FLOATING_DECIMAL_POINT_TYPES: &[ValueType] = &[ValueType::Decimal];
const INTEGER_TYPES: &[ValueType] = &[
    ValueType::Int16,
    ValueType::Int32,
    ValueType::UInt16,
    ValueType::UInt32,
];
const STRING_TYPES: &[ValueType] = &[ValueType::String];

/// Built-in mapping from a family of value types to one catalog definition.
#[derive(Debug, Clone)]
pub struct ValueTypeMapping {
    supported: &'static [ValueType],
    definition_name: &'static str,
}

impl ValueTypeMapping {
    pub fn boolean() -> Self {
        Self {
            supported: BOOLEAN_TYPES,
            definition_name: BOOLEAN_DEFINITION,
        }
    }

    pub fn date_time() -> Self {
        Self {
            supported: DATE_TIME_TYPES,
            definition_name: DATE_TIME_DEFINITION,
        }
    }

    /// `f32`/`f64` are stored as text and parsed back on read.
    pub fn floating_binary_point() -> Self {
        Self {
            supported: FLOATING_BINARY_POINT_TYPES,
            definition_name: TEXT_DEFINITION,
        }
    }

    /// `decimal` is stored as text and parsed back on read.
    pub fn floating_decimal_point() -> Self {
        Self {
            supported: FLOATING_DECIMAL_POINT_TYPES,
            definition_name: TEXT_DEFINITION,
        }
    }

    pub fn integer() -> Self {
        Self {
            supported: INTEGER_TYPES,
            definition_name: NUMERIC_DEFINITION,
        }
    }

    pub fn string() -> Self {
        Self {
            supported: STRING_TYPES,
            definition_name: TEXT_DEFINITION,
        }
    }
}

impl DataTypeMapping for ValueTypeMapping {
    fn can_map(&self, declared: &DeclaredType) -> bool {
        self.supported.contains(&declared.value_type)
    }

    fn definition(
        &self,
        declared: &DeclaredType,
        catalog: &DataTypeCatalog,
    ) -> Option<DataTypeDefinition> {
        if !self.can_map(declared) {
            return None;
        }
        catalog.by_name(self.definition_name).cloned()
    }
}

/// Extension mapping binding a declared type to a catalog definition by name.
#[derive(Debug, Clone)]
pub struct NamedMapping {
    definition_name: String,
}

impl NamedMapping {
    pub fn new(definition_name: impl Into<String>) -> Self {
        Self {
            definition_name: definition_name.into(),
        }
    }
}

impl DataTypeMapping for NamedMapping {
    fn can_map(&self, _declared: &DeclaredType) -> bool {
        true
    }

    fn definition(
        &self,
        _declared: &DeclaredType,
        catalog: &DataTypeCatalog,
    ) -> Option<DataTypeDefinition> {
        catalog.by_name(&self.definition_name).cloned()
    }
}

/// Registry resolving `(ui hint, declared type)` to a data-type definition.
pub struct TypeMappingRegistry {
    catalog: DataTypeCatalog,
    default_mapping: Box<dyn HintMapping>,
    mappings: HashMap<DeclaredType, Arc<dyn DataTypeMapping>>,
}

impl TypeMappingRegistry {
    /// An empty registry over `catalog`; only UI hints resolve.
    pub fn new(catalog: DataTypeCatalog) -> Self {
        Self {
            catalog,
            default_mapping: Box::new(CatalogHintMapping),
            mappings: HashMap::new(),
        }
    }

    /// The built-in catalog and built-in type table.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new(DataTypeCatalog::builtin());
        registry.register_defaults();
        registry
    }

    /// Register the built-in type table, plain and optional variants.
    pub fn register_defaults(&mut self) {
        let table: [(ValueType, Arc<dyn DataTypeMapping>); 10] = [
            (ValueType::Bool, Arc::new(ValueTypeMapping::boolean())),
            (ValueType::DateTime, Arc::new(ValueTypeMapping::date_time())),
            (ValueType::Float32, Arc::new(ValueTypeMapping::floating_binary_point())),
            (ValueType::Float64, Arc::new(ValueTypeMapping::floating_binary_point())),
            (ValueType::Decimal, Arc::new(ValueTypeMapping::floating_decimal_point())),
            (ValueType::Int16, Arc::new(ValueTypeMapping::integer())),
            (ValueType::Int32, Arc::new(ValueTypeMapping::integer())),
            (ValueType::UInt16, Arc::new(ValueTypeMapping::integer())),
            (ValueType::UInt32, Arc::new(ValueTypeMapping::integer())),
            (ValueType::String, Arc::new(ValueTypeMapping::string())),
        ];

        for (value_type, mapping) in table {
            // Strings have no separate optional variant.
            if value_type != ValueType::String {
                self.register(DeclaredType::optional(value_type.clone()), Arc::clone(&mapping));
            }
            self.register(DeclaredType::new(value_type), mapping);
        }
    }

    /// Register a mapping for an exact declared type. Last registration wins.
    pub fn register(&mut self, declared: DeclaredType, mapping: Arc<dyn DataTypeMapping>) {
        self.mappings.insert(declared, mapping);
    }

    /// Add or replace a data-type definition in the catalog.
    pub fn register_data_type(&mut self, definition: DataTypeDefinition) {
        self.catalog.insert(definition);
    }

    /// Replace the hint mapping consulted ahead of the type table.
    pub fn set_default_mapping(&mut self, mapping: Box<dyn HintMapping>) {
        self.default_mapping = mapping;
    }

    pub fn catalog(&self) -> &DataTypeCatalog {
        &self.catalog
    }

    /// The type-keyed mapping for `declared`, if registered and still willing.
    pub fn mapping_for(&self, declared: &DeclaredType) -> Option<&dyn DataTypeMapping> {
        self.mappings
            .get(declared)
            .map(|m| m.as_ref())
            .filter(|m| m.can_map(declared))
    }

    /// Registered declared types, sorted by display name.
    pub fn registered_types(&self) -> Vec<&DeclaredType> {
        let mut types: Vec<_> = self.mappings.keys().collect();
        types.sort_by_key(|t| t.to_string());
        types
    }

    /// Resolve the data-type definition for a declared property.
    pub fn resolve(
        &self,
        ui_hint: Option<&str>,
        declared: &DeclaredType,
    ) -> Result<DataTypeDefinition, MappingError> {
        let hint = ui_hint.map(str::trim).filter(|h| !h.is_empty());

        if let Some(hint) = hint {
            if self.default_mapping.can_map(hint, declared, &self.catalog) {
                if let Some(definition) = self.default_mapping.definition(hint, declared, &self.catalog) {
                    return Ok(definition);
                }
            }
        }

        self.mapping_for(declared)
            .and_then(|m| m.definition(declared, &self.catalog))
            .ok_or_else(|| MappingError::NoMappingFound {
                ui_hint: hint.map(str::to_string),
                declared_type: declared.clone(),
            })
    }
}

impl Default for TypeMappingRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for TypeMappingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMappingRegistry")
            .field("catalog", &self.catalog)
            .field("registered_types", &self.registered_types())
            .finish()
    }
}

static DEFAULT_TYPE_MAPPINGS: Lazy<TypeMappingRegistry> = Lazy::new(TypeMappingRegistry::with_defaults);

/// The process-wide built-in registry.
pub fn default_type_mappings() -> &'static TypeMappingRegistry {
    &DEFAULT_TYPE_MAPPINGS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let registry = TypeMappingRegistry::with_defaults();

        let cases = [
            ("bool", BOOLEAN_DEFINITION),
            ("bool?", BOOLEAN_DEFINITION),
            ("datetime", DATE_TIME_DEFINITION),
            ("f32", TEXT_DEFINITION),
            ("f64?", TEXT_DEFINITION),
            ("decimal", TEXT_DEFINITION),
            ("i16", NUMERIC_DEFINITION),
            ("u32?", NUMERIC_DEFINITION),
            ("string", TEXT_DEFINITION),
        ];

        for (declared, expected) in cases {
            let declared: DeclaredType = declared.parse().unwrap();
            let definition = registry.resolve(None, &declared).unwrap();
            assert_eq!(definition.name, expected, "for {}", declared);
        }
    }

    #[test]
    fn test_unmapped_type_fails() {
        let registry = TypeMappingRegistry::with_defaults();
        let err = registry.resolve(None, &DeclaredType::named("Color")).unwrap_err();
        assert_eq!(
            err,
            MappingError::NoMappingFound {
                ui_hint: None,
                declared_type: DeclaredType::named("Color"),
            }
        );
        assert_eq!(err.to_string(), "No data type definition for Color");
    }

    #[test]
    fn test_optional_string_is_not_seeded() {
        let registry = TypeMappingRegistry::with_defaults();
        assert!(registry.resolve(None, &DeclaredType::string().or_none()).is_err());
    }

    #[test]
    fn test_hint_takes_priority_over_type() {
        let mut registry = TypeMappingRegistry::with_defaults();
        registry.register_data_type(DataTypeDefinition::new(2001, "rte", "Custom.Rte", StorageType::Ntext));

        let definition = registry.resolve(Some("rte"), &DeclaredType::string()).unwrap();
        assert_eq!(definition.id, DataTypeId(2001));
    }

    #[test]
    fn test_hint_matches_editor_alias() {
        let registry = TypeMappingRegistry::with_defaults();
        let definition = registry
            .resolve(Some("Umbraco.TinyMCEv3"), &DeclaredType::string())
            .unwrap();
        assert_eq!(definition.name, RICH_TEXT_DEFINITION);
    }

    #[test]
    fn test_hint_binds_regardless_of_type() {
        let registry = TypeMappingRegistry::with_defaults();
        let definition = registry
            .resolve(Some(TEXTAREA_DEFINITION), &DeclaredType::named("Color"))
            .unwrap();
        assert_eq!(definition.name, TEXTAREA_DEFINITION);
    }

    #[test]
    fn test_unknown_hint_falls_back_to_type() {
        let registry = TypeMappingRegistry::with_defaults();
        let definition = registry.resolve(Some("nope"), &DeclaredType::int32()).unwrap();
        assert_eq!(definition.name, NUMERIC_DEFINITION);

        let definition = registry.resolve(Some("   "), &DeclaredType::int32()).unwrap();
        assert_eq!(definition.name, NUMERIC_DEFINITION);
    }

    #[test]
    fn test_unknown_hint_and_type_reports_hint() {
        let registry = TypeMappingRegistry::with_defaults();
        let err = registry.resolve(Some("nope"), &DeclaredType::named("Color")).unwrap_err();
        assert_eq!(err.to_string(), "No data type definition for Color (UI hint 'nope')");
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = TypeMappingRegistry::with_defaults();
        registry.register(DeclaredType::string(), Arc::new(NamedMapping::new(TEXTAREA_DEFINITION)));

        let definition = registry.resolve(None, &DeclaredType::string()).unwrap();
        assert_eq!(definition.name, TEXTAREA_DEFINITION);
    }

    struct Declining;

    impl DataTypeMapping for Declining {
        fn can_map(&self, _declared: &DeclaredType) -> bool {
            false
        }

        fn definition(&self, _: &DeclaredType, catalog: &DataTypeCatalog) -> Option<DataTypeDefinition> {
            catalog.by_name(TEXT_DEFINITION).cloned()
        }
    }

    #[test]
    fn test_mapping_may_decline_after_key_match() {
        let mut registry = TypeMappingRegistry::with_defaults();
        registry.register(DeclaredType::named("Color"), Arc::new(Declining));

        assert!(registry.mapping_for(&DeclaredType::named("Color")).is_none());
        assert!(registry.resolve(None, &DeclaredType::named("Color")).is_err());
    }

    #[test]
    fn test_named_mapping_needs_catalog_entry() {
        let mut registry = TypeMappingRegistry::with_defaults();
        registry.register(DeclaredType::named("Color"), Arc::new(NamedMapping::new("Color Picker")));
        assert!(registry.resolve(None, &DeclaredType::named("Color")).is_err());

        registry.register_data_type(DataTypeDefinition::new(
            1050,
            "Color Picker",
            "Umbraco.ColorPicker",
            StorageType::Nvarchar,
        ));
        let definition = registry.resolve(None, &DeclaredType::named("Color")).unwrap();
        assert_eq!(definition.id, DataTypeId(1050));
    }

    #[test]
    fn test_catalog_insert_replaces_by_id_or_name() {
        let mut catalog = DataTypeCatalog::builtin();
        let before = catalog.len();
        catalog.insert(DataTypeDefinition::new(-88, "Text", "Custom.Text", StorageType::Nvarchar));
        assert_eq!(catalog.len(), before);
        assert!(catalog.by_name(TEXT_DEFINITION).is_none());
        assert_eq!(catalog.by_id(DataTypeId(-88)).unwrap().name, "Text");
    }

    #[test]
    fn test_empty_registry_resolves_hints_only() {
        let registry = TypeMappingRegistry::new(DataTypeCatalog::builtin());
        assert!(registry.resolve(None, &DeclaredType::bool()).is_err());
        assert!(registry.resolve(Some(BOOLEAN_DEFINITION), &DeclaredType::bool()).is_ok());
    }

    #[test]
    fn test_default_registry_is_shared() {
        let a = default_type_mappings() as *const TypeMappingRegistry;
        let b = default_type_mappings() as *const TypeMappingRegistry;
        assert_eq!(a, b);
        assert_eq!(default_type_mappings().registered_types().len(), 19);
    }
}
