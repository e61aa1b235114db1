//! Declared Model Types
//!
//! The declared side of reconciliation: what application code says the
//! content types should look like. Built once per run and never mutated by
//! the engine.

use crate::alias::to_alias;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Backend collection a content type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Document,
    Media,
    Member,
}

impl ContentKind {
    /// All kinds, in the order a full startup run processes them.
    pub const ALL: [ContentKind; 3] = [ContentKind::Document, ContentKind::Media, ContentKind::Member];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Document => "document",
            ContentKind::Media => "media",
            ContentKind::Member => "member",
        }
    }

    /// Icon a freshly constructed backend type of this kind carries.
    pub fn default_icon(&self) -> &'static str {
        match self {
            ContentKind::Document => "icon-document",
            ContentKind::Media => "icon-picture",
            ContentKind::Member => "icon-user",
        }
    }

    /// Thumbnail a freshly constructed backend type of this kind carries.
    pub fn default_thumbnail(&self) -> &'static str {
        match self {
            ContentKind::Document | ContentKind::Media => "folder.png",
            ContentKind::Member => "member.png",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "document" | "documents" => Ok(ContentKind::Document),
            "media" => Ok(ContentKind::Media),
            "member" | "members" => Ok(ContentKind::Member),
            _ => Err(format!("Invalid content kind: '{}'. Expected: document, media, or member", s)),
        }
    }
}

/// Runtime value type of a declared property, without optionality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Bool,
    DateTime,
    Float32,
    Float64,
    Decimal,
    Int16,
    Int32,
    UInt16,
    UInt32,
    String,
    /// Rich text, rendered as markup
    Html,
    /// Application-defined type, mapped through registered extensions only
    Named(String),
}

impl ValueType {
    pub fn name(&self) -> &str {
        match self {
            ValueType::Bool => "bool",
            ValueType::DateTime => "datetime",
            ValueType::Float32 => "f32",
            ValueType::Float64 => "f64",
            ValueType::Decimal => "decimal",
            ValueType::Int16 => "i16",
            ValueType::Int32 => "i32",
            ValueType::UInt16 => "u16",
            ValueType::UInt32 => "u32",
            ValueType::String => "string",
            ValueType::Html => "html",
            ValueType::Named(name) => name,
        }
    }

    fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "bool" | "boolean" => ValueType::Bool,
            "datetime" | "date_time" => ValueType::DateTime,
            "f32" | "float" => ValueType::Float32,
            "f64" | "double" => ValueType::Float64,
            "decimal" => ValueType::Decimal,
            "i16" | "short" => ValueType::Int16,
            "i32" | "int" => ValueType::Int32,
            "u16" | "ushort" => ValueType::UInt16,
            "u32" | "uint" => ValueType::UInt32,
            "string" => ValueType::String,
            "html" => ValueType::Html,
            _ => ValueType::Named(s.to_string()),
        }
    }
}

/// A declared property or conversion type.
///
/// Optional variants are distinct registry keys: `i32` and `i32?` resolve
/// independently.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeclaredType {
    pub value_type: ValueType,
    pub optional: bool,
}

impl DeclaredType {
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            optional: false,
        }
    }

    pub fn optional(value_type: ValueType) -> Self {
        Self {
            value_type,
            optional: true,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::new(ValueType::Named(name.into()))
    }

    pub fn bool() -> Self {
        Self::new(ValueType::Bool)
    }

    pub fn string() -> Self {
        Self::new(ValueType::String)
    }

    pub fn html() -> Self {
        Self::new(ValueType::Html)
    }

    pub fn int32() -> Self {
        Self::new(ValueType::Int32)
    }

    pub fn float32() -> Self {
        Self::new(ValueType::Float32)
    }

    pub fn float64() -> Self {
        Self::new(ValueType::Float64)
    }

    pub fn decimal() -> Self {
        Self::new(ValueType::Decimal)
    }

    pub fn date_time() -> Self {
        Self::new(ValueType::DateTime)
    }

    /// The optional variant of this type.
    pub fn or_none(mut self) -> Self {
        self.optional = true;
        self
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.optional {
            write!(f, "{}?", self.value_type.name())
        } else {
            write!(f, "{}", self.value_type.name())
        }
    }
}

impl FromStr for DeclaredType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (base, optional) = match trimmed.strip_suffix('?') {
            Some(base) => (base.trim(), true),
            None => (trimmed, false),
        };
        if base.is_empty() {
            return Err(format!("Invalid declared type: '{}'", s));
        }
        Ok(Self {
            value_type: ValueType::parse(base),
            optional,
        })
    }
}

/// A declared property of a content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    /// Correlation key against persisted properties; unique within the owner
    pub alias: String,
    pub declared_type: DeclaredType,
    pub ui_hint: Option<String>,
    pub mandatory: bool,
    pub description: String,
    pub validation_pattern: Option<String>,
    pub sort_order: Option<i32>,
    pub property_group: Option<String>,
}

impl PropertyDefinition {
    /// Create a property whose alias follows the alias convention for `name`.
    pub fn new(name: impl Into<String>, declared_type: DeclaredType) -> Self {
        let name = name.into();
        Self {
            alias: to_alias(&name),
            name,
            declared_type,
            ui_hint: None,
            mandatory: false,
            description: String::new(),
            validation_pattern: None,
            sort_order: None,
            property_group: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn with_ui_hint(mut self, ui_hint: impl Into<String>) -> Self {
        self.ui_hint = Some(ui_hint.into());
        self
    }

    pub fn mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_validation_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.validation_pattern = Some(pattern.into());
        self
    }

    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.property_group = Some(group.into());
        self
    }

    /// The declared group, treating blank names as "no group".
    pub fn group(&self) -> Option<&str> {
        self.property_group
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
    }
}

/// Reference to another declared content type by its type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeRef(pub String);

impl TypeRef {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self(type_name.into())
    }

    pub fn type_name(&self) -> &str {
        &self.0
    }

    /// Alias the referenced type is stored under.
    pub fn alias(&self) -> String {
        to_alias(&self.0)
    }
}

/// A declared content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentTypeDefinition {
    /// Model type name; other definitions reference this one through it
    pub type_name: String,
    /// Optional stable key handed to the backend on creation
    pub id: Option<Uuid>,
    pub name: String,
    pub alias: String,
    pub description: String,
    pub allowed_as_root: bool,
    pub icon: Option<String>,
    pub thumbnail: Option<String>,
    /// In declaration order
    pub properties: Vec<PropertyDefinition>,
    /// In declaration order; may name types not persisted yet
    pub allowed_child_types: Vec<TypeRef>,
}

impl ContentTypeDefinition {
    /// Create a definition whose alias follows the alias convention for `type_name`.
    pub fn new(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            alias: to_alias(&type_name),
            type_name,
            id: None,
            name: name.into(),
            description: String::new(),
            allowed_as_root: false,
            icon: None,
            thumbnail: None,
            properties: Vec::new(),
            allowed_child_types: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn allowed_as_root(mut self, allowed: bool) -> Self {
        self.allowed_as_root = allowed;
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    pub fn with_property(mut self, property: PropertyDefinition) -> Self {
        self.properties.push(property);
        self
    }

    pub fn allow_child(mut self, type_name: impl Into<String>) -> Self {
        self.allowed_child_types.push(TypeRef::new(type_name));
        self
    }

    pub fn property(&self, alias: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.alias == alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_type_parse() {
        assert_eq!("i32".parse::<DeclaredType>().unwrap(), DeclaredType::int32());
        assert_eq!("int?".parse::<DeclaredType>().unwrap(), DeclaredType::int32().or_none());
        assert_eq!(" double ".parse::<DeclaredType>().unwrap(), DeclaredType::float64());
        assert_eq!("Color".parse::<DeclaredType>().unwrap(), DeclaredType::named("Color"));
        assert!("?".parse::<DeclaredType>().is_err());
        assert!("".parse::<DeclaredType>().is_err());
    }

    #[test]
    fn test_declared_type_display() {
        assert_eq!(DeclaredType::decimal().or_none().to_string(), "decimal?");
        assert_eq!(DeclaredType::named("Color").to_string(), "Color");
    }

    #[test]
    fn test_optional_is_distinct_key() {
        assert_ne!(DeclaredType::bool(), DeclaredType::bool().or_none());
    }

    #[test]
    fn test_definition_builder_derives_aliases() {
        let def = ContentTypeDefinition::new("NewsPage", "News page")
            .with_property(PropertyDefinition::new("Body Text", DeclaredType::string()))
            .allow_child("NewsItem");

        assert_eq!(def.alias, "newsPage");
        assert_eq!(def.properties[0].alias, "bodyText");
        assert_eq!(def.allowed_child_types[0].alias(), "newsItem");
        assert!(def.icon.is_none());
    }

    #[test]
    fn test_blank_group_is_no_group() {
        let prop = PropertyDefinition::new("Title", DeclaredType::string()).in_group("  ");
        assert_eq!(prop.group(), None);
        let prop = prop.in_group("Content");
        assert_eq!(prop.group(), Some("Content"));
    }

    #[test]
    fn test_content_kind_parse() {
        assert_eq!("Documents".parse::<ContentKind>().unwrap(), ContentKind::Document);
        assert!("templates".parse::<ContentKind>().is_err());
    }
}
