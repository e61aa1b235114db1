//! Declared model manifest
//!
//! A TOML file listing the declared content types per kind:
//!
//! ```toml
//! [[document_types]]
//! type = "NewsPage"
//! name = "News page"
//! allowed_as_root = true
//! allowed_child_types = ["NewsItem"]
//!
//! [[document_types.properties]]
//! name = "Body"
//! type = "string"
//! ui_hint = "rte"
//! group = "Content"
//! ```
//!
//! Aliases default to the alias convention applied to `type` and `name`.

use crate::definition::{ContentKind, ContentTypeDefinition, DeclaredType, PropertyDefinition};
use crate::model::DeclaredModel;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid type for property '{property}' of '{content_type}': {message}")]
    InvalidType {
        content_type: String,
        property: String,
        message: String,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    #[serde(default)]
    document_types: Vec<ContentTypeEntry>,
    #[serde(default)]
    media_types: Vec<ContentTypeEntry>,
    #[serde(default)]
    member_types: Vec<ContentTypeEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ContentTypeEntry {
    #[serde(rename = "type")]
    type_name: String,
    name: Option<String>,
    alias: Option<String>,
    id: Option<Uuid>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    allowed_as_root: bool,
    icon: Option<String>,
    thumbnail: Option<String>,
    #[serde(default)]
    allowed_child_types: Vec<String>,
    #[serde(default)]
    properties: Vec<PropertyEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PropertyEntry {
    name: String,
    #[serde(rename = "type")]
    declared_type: String,
    alias: Option<String>,
    ui_hint: Option<String>,
    #[serde(default)]
    mandatory: bool,
    #[serde(default)]
    description: String,
    validation_pattern: Option<String>,
    sort_order: Option<i32>,
    group: Option<String>,
}

impl ContentTypeEntry {
    fn into_definition(self) -> Result<ContentTypeDefinition, ManifestError> {
        let name = self.name.unwrap_or_else(|| self.type_name.clone());
        let mut definition = ContentTypeDefinition::new(self.type_name, name)
            .with_description(self.description)
            .allowed_as_root(self.allowed_as_root);

        if let Some(alias) = self.alias {
            definition = definition.with_alias(alias);
        }
        definition.id = self.id;
        definition.icon = self.icon;
        definition.thumbnail = self.thumbnail;

        for child in self.allowed_child_types {
            definition = definition.allow_child(child);
        }

        for property in self.properties {
            let property = property.into_definition(&definition.type_name)?;
            definition = definition.with_property(property);
        }

        Ok(definition)
    }
}

impl PropertyEntry {
    fn into_definition(self, content_type: &str) -> Result<PropertyDefinition, ManifestError> {
        let declared_type: DeclaredType =
            self.declared_type
                .parse()
                .map_err(|message| ManifestError::InvalidType {
                    content_type: content_type.to_string(),
                    property: self.name.clone(),
                    message,
                })?;

        let mut property = PropertyDefinition::new(self.name, declared_type)
            .mandatory(self.mandatory)
            .with_description(self.description);

        if let Some(alias) = self.alias {
            property = property.with_alias(alias);
        }
        property.ui_hint = self.ui_hint;
        property.validation_pattern = self.validation_pattern;
        property.sort_order = self.sort_order;
        property.property_group = self.group;

        Ok(property)
    }
}

/// Parse a manifest from TOML text.
pub fn parse_manifest(content: &str) -> Result<DeclaredModel, ManifestError> {
    let file: ManifestFile = toml::from_str(content)?;
    let mut model = DeclaredModel::new();

    for (kind, entries) in [
        (ContentKind::Document, file.document_types),
        (ContentKind::Media, file.media_types),
        (ContentKind::Member, file.member_types),
    ] {
        for entry in entries {
            model.push(kind, entry.into_definition()?);
        }
    }

    Ok(model)
}

/// Load a manifest file.
pub fn load_manifest(path: &Path) -> Result<DeclaredModel, ManifestError> {
    let content = std::fs::read_to_string(path)?;
    parse_manifest(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ValueType;
    use crate::model::{KindClassifier, ModelProvider};

    const MANIFEST: &str = r#"
[[document_types]]
type = "NewsPage"
name = "News page"
allowed_as_root = true
icon = "icon-newspaper"
allowed_child_types = ["NewsItem"]

[[document_types.properties]]
name = "Body Text"
type = "string"
ui_hint = "rte"
group = "Content"

[[document_types.properties]]
name = "Rating"
type = "decimal?"
sort_order = 3

[[document_types]]
type = "NewsItem"
id = "8f0c5a0e-2a54-4e0f-9d0b-3f1b8c2f6a11"

[[media_types]]
type = "Photo"
alias = "photoImage"
"#;

    #[test]
    fn test_parse_manifest() {
        let model = parse_manifest(MANIFEST).unwrap();

        let docs = model.definitions(ContentKind::Document);
        assert_eq!(docs.len(), 2);

        let page = &docs[0];
        assert_eq!(page.alias, "newsPage");
        assert_eq!(page.name, "News page");
        assert!(page.allowed_as_root);
        assert_eq!(page.icon.as_deref(), Some("icon-newspaper"));
        assert_eq!(page.thumbnail, None);
        assert_eq!(page.allowed_child_types[0].alias(), "newsItem");

        let body = page.property("bodyText").unwrap();
        assert_eq!(body.ui_hint.as_deref(), Some("rte"));
        assert_eq!(body.group(), Some("Content"));

        let rating = page.property("rating").unwrap();
        assert_eq!(rating.declared_type, DeclaredType::optional(ValueType::Decimal));
        assert_eq!(rating.sort_order, Some(3));

        let item = &docs[1];
        assert_eq!(item.name, "NewsItem");
        assert!(item.id.is_some());

        let photo = &model.definitions(ContentKind::Media)[0];
        assert_eq!(photo.alias, "photoImage");
        assert_eq!(model.kind_of(photo), Some(ContentKind::Media));
    }

    #[test]
    fn test_invalid_property_type() {
        let err = parse_manifest(
            r#"
[[member_types]]
type = "Customer"

[[member_types.properties]]
name = "Level"
type = "?"
"#,
        )
        .unwrap_err();

        match err {
            ManifestError::InvalidType {
                content_type,
                property,
                ..
            } => {
                assert_eq!(content_type, "Customer");
                assert_eq!(property, "Level");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            parse_manifest("[[document_types]]\ntype = \"A\"\ncolour = \"red\"\n"),
            Err(ManifestError::Toml(_))
        ));
    }

    #[test]
    fn test_empty_manifest() {
        assert!(parse_manifest("").unwrap().is_empty());
    }
}
