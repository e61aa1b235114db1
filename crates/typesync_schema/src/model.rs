//! Declared model provider and kind classification.

use crate::definition::{ContentKind, ContentTypeDefinition};

/// Supplies the ordered batch of declared content types for one kind.
pub trait ModelProvider {
    fn definitions(&self, kind: ContentKind) -> &[ContentTypeDefinition];
}

/// Decides which backend collection a declared content type belongs to.
pub trait KindClassifier {
    fn kind_of(&self, definition: &ContentTypeDefinition) -> Option<ContentKind>;
}

/// Every definition belongs to this one kind.
impl KindClassifier for ContentKind {
    fn kind_of(&self, _definition: &ContentTypeDefinition) -> Option<ContentKind> {
        Some(*self)
    }
}

/// The full declared model, one ordered batch per kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclaredModel {
    document_types: Vec<ContentTypeDefinition>,
    media_types: Vec<ContentTypeDefinition>,
    member_types: Vec<ContentTypeDefinition>,
}

impl DeclaredModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a definition to the `kind` batch.
    pub fn push(&mut self, kind: ContentKind, definition: ContentTypeDefinition) {
        self.batch_mut(kind).push(definition);
    }

    pub fn with(mut self, kind: ContentKind, definition: ContentTypeDefinition) -> Self {
        self.push(kind, definition);
        self
    }

    /// Kind of the definition declared under `type_name`.
    ///
    /// `None` when no kind or more than one kind declares that name.
    pub fn kind_of_type(&self, type_name: &str) -> Option<ContentKind> {
        let mut kinds = ContentKind::ALL.into_iter().filter(|kind| {
            self.definitions(*kind)
                .iter()
                .any(|d| d.type_name == type_name)
        });
        match (kinds.next(), kinds.next()) {
            (Some(kind), None) => Some(kind),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.document_types.len() + self.media_types.len() + self.member_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn batch_mut(&mut self, kind: ContentKind) -> &mut Vec<ContentTypeDefinition> {
        match kind {
            ContentKind::Document => &mut self.document_types,
            ContentKind::Media => &mut self.media_types,
            ContentKind::Member => &mut self.member_types,
        }
    }
}

impl ModelProvider for DeclaredModel {
    fn definitions(&self, kind: ContentKind) -> &[ContentTypeDefinition] {
        match kind {
            ContentKind::Document => &self.document_types,
            ContentKind::Media => &self.media_types,
            ContentKind::Member => &self.member_types,
        }
    }
}

/// Definitions borrowed from the model are classified by the batch holding
/// them, so a type name reused across kinds stays with its own kind.
impl KindClassifier for DeclaredModel {
    fn kind_of(&self, definition: &ContentTypeDefinition) -> Option<ContentKind> {
        ContentKind::ALL
            .into_iter()
            .find(|kind| {
                self.definitions(*kind)
                    .iter()
                    .any(|d| std::ptr::eq(d, definition))
            })
            .or_else(|| self.kind_of_type(&definition.type_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batches_keep_declaration_order() {
        let model = DeclaredModel::new()
            .with(ContentKind::Document, ContentTypeDefinition::new("Home", "Home"))
            .with(ContentKind::Media, ContentTypeDefinition::new("Photo", "Photo"))
            .with(ContentKind::Document, ContentTypeDefinition::new("Article", "Article"));

        let docs: Vec<_> = model
            .definitions(ContentKind::Document)
            .iter()
            .map(|d| d.alias.as_str())
            .collect();
        assert_eq!(docs, vec!["home", "article"]);
        assert_eq!(model.len(), 3);
        assert!(model.definitions(ContentKind::Member).is_empty());
    }

    #[test]
    fn test_classifies_by_type_name() {
        let photo = ContentTypeDefinition::new("Photo", "Photo");
        let model = DeclaredModel::new().with(ContentKind::Media, photo.clone());

        assert_eq!(model.kind_of(&photo), Some(ContentKind::Media));
        assert_eq!(model.kind_of(&ContentTypeDefinition::new("Other", "Other")), None);
        assert_eq!(ContentKind::Member.kind_of(&photo), Some(ContentKind::Member));
    }

    #[test]
    fn test_shared_type_name_classified_by_batch() {
        let model = DeclaredModel::new()
            .with(ContentKind::Document, ContentTypeDefinition::new("Folder", "Folder"))
            .with(ContentKind::Media, ContentTypeDefinition::new("Folder", "Folder"));

        let media_folder = &model.definitions(ContentKind::Media)[0];
        let document_folder = &model.definitions(ContentKind::Document)[0];
        assert_eq!(model.kind_of(media_folder), Some(ContentKind::Media));
        assert_eq!(model.kind_of(document_folder), Some(ContentKind::Document));

        // a detached copy cannot be told apart
        assert_eq!(model.kind_of(&ContentTypeDefinition::new("Folder", "Folder")), None);
        assert_eq!(model.kind_of_type("Folder"), None);
    }
}
