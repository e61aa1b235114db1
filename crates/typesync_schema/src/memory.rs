//! In-memory schema store with an optional JSON snapshot on disk.

use crate::definition::ContentKind;
use crate::store::{BackendContentType, ContentTypeId, SchemaStore, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Per-kind content type collections, kept in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemorySchemaStore {
    #[serde(default)]
    document_types: Vec<BackendContentType>,
    #[serde(default)]
    media_types: Vec<BackendContentType>,
    #[serde(default)]
    member_types: Vec<BackendContentType>,
    /// Last id handed out; ids are unique across kinds
    #[serde(default)]
    next_id: i32,
    #[serde(skip)]
    save_counts: HashMap<(ContentKind, String), usize>,
}

impl MemorySchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot written by [`flush`](Self::flush). A missing file
    /// yields an empty store.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!("No store snapshot at {}, starting empty", path.display());
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path)?;
        let store: Self = serde_json::from_str(&content)?;
        Ok(store)
    }

    /// Write the store as a JSON snapshot, replacing the file atomically.
    pub fn flush(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// How often `alias` of `kind` has been saved since the store was opened.
    pub fn save_count(&self, kind: ContentKind, alias: &str) -> usize {
        self.save_counts
            .get(&(kind, alias.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Total saves across all kinds since the store was opened.
    pub fn total_saves(&self) -> usize {
        self.save_counts.values().sum()
    }

    pub fn len(&self, kind: ContentKind) -> usize {
        self.collection(kind).len()
    }

    fn collection(&self, kind: ContentKind) -> &Vec<BackendContentType> {
        match kind {
            ContentKind::Document => &self.document_types,
            ContentKind::Media => &self.media_types,
            ContentKind::Member => &self.member_types,
        }
    }

    fn collection_mut(&mut self, kind: ContentKind) -> &mut Vec<BackendContentType> {
        match kind {
            ContentKind::Document => &mut self.document_types,
            ContentKind::Media => &mut self.media_types,
            ContentKind::Member => &mut self.member_types,
        }
    }
}

impl SchemaStore for MemorySchemaStore {
    fn get_content_type(
        &self,
        kind: ContentKind,
        alias: &str,
    ) -> Result<Option<BackendContentType>, StoreError> {
        Ok(self
            .collection(kind)
            .iter()
            .find(|ct| ct.alias == alias)
            .cloned())
    }

    fn save(
        &mut self,
        kind: ContentKind,
        content_type: &mut BackendContentType,
    ) -> Result<(), StoreError> {
        if content_type.alias.trim().is_empty() {
            return Err(StoreError::Rejected(format!(
                "{} type without alias",
                kind
            )));
        }

        let existing = self
            .collection(kind)
            .iter()
            .find(|ct| ct.alias == content_type.alias)
            .and_then(|ct| ct.id);

        match content_type.id {
            None => {
                if let Some(existing) = existing {
                    return Err(StoreError::AliasConflict {
                        kind,
                        alias: content_type.alias.clone(),
                        existing,
                    });
                }
                self.next_id += 1;
                content_type.id = Some(ContentTypeId(self.next_id));
                debug!(
                    "Stored new {} type '{}' as {}",
                    kind, content_type.alias, self.next_id
                );
                self.collection_mut(kind).push(content_type.clone());
            }
            Some(id) => {
                if let Some(existing) = existing.filter(|e| *e != id) {
                    return Err(StoreError::AliasConflict {
                        kind,
                        alias: content_type.alias.clone(),
                        existing,
                    });
                }
                let Some(slot) = self
                    .collection_mut(kind)
                    .iter_mut()
                    .find(|ct| ct.id == Some(id))
                else {
                    return Err(StoreError::NotFound { kind, id });
                };
                *slot = content_type.clone();
            }
        }

        *self
            .save_counts
            .entry((kind, content_type.alias.clone()))
            .or_insert(0) += 1;
        Ok(())
    }

    fn content_types(&self, kind: ContentKind) -> Result<Vec<BackendContentType>, StoreError> {
        Ok(self.collection(kind).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn named(kind: ContentKind, alias: &str) -> BackendContentType {
        let mut ct = BackendContentType::new(kind);
        ct.alias = alias.to_string();
        ct.name = alias.to_string();
        ct
    }

    #[test]
    fn test_save_assigns_ids() {
        let mut store = MemorySchemaStore::new();
        let mut a = named(ContentKind::Document, "a");
        let mut b = named(ContentKind::Media, "b");

        store.save(ContentKind::Document, &mut a).unwrap();
        store.save(ContentKind::Media, &mut b).unwrap();

        assert_eq!(a.id, Some(ContentTypeId(1)));
        assert_eq!(b.id, Some(ContentTypeId(2)));
        assert_eq!(store.len(ContentKind::Document), 1);
        assert_eq!(store.len(ContentKind::Media), 1);
    }

    #[test]
    fn test_lookup_is_per_kind() {
        let mut store = MemorySchemaStore::new();
        let mut a = named(ContentKind::Document, "a");
        store.save(ContentKind::Document, &mut a).unwrap();

        assert!(store.get_content_type(ContentKind::Document, "a").unwrap().is_some());
        assert!(store.get_content_type(ContentKind::Media, "a").unwrap().is_none());
    }

    #[test]
    fn test_save_updates_in_place() {
        let mut store = MemorySchemaStore::new();
        let mut a = named(ContentKind::Document, "a");
        store.save(ContentKind::Document, &mut a).unwrap();

        let mut loaded = store.get_content_type(ContentKind::Document, "a").unwrap().unwrap();
        loaded.description = "changed".to_string();
        store.save(ContentKind::Document, &mut loaded).unwrap();

        let stored = store.content_types(ContentKind::Document).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].description, "changed");
        assert_eq!(store.save_count(ContentKind::Document, "a"), 2);
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let mut store = MemorySchemaStore::new();
        store.save(ContentKind::Document, &mut named(ContentKind::Document, "a")).unwrap();

        let err = store
            .save(ContentKind::Document, &mut named(ContentKind::Document, "a"))
            .unwrap_err();
        assert!(matches!(err, StoreError::AliasConflict { .. }));
    }

    #[test]
    fn test_unknown_id_not_found() {
        let mut store = MemorySchemaStore::new();
        let mut ghost = named(ContentKind::Document, "ghost");
        ghost.id = Some(ContentTypeId(99));

        let err = store.save(ContentKind::Document, &mut ghost).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("store.json");

        let mut store = MemorySchemaStore::new();
        store.save(ContentKind::Member, &mut named(ContentKind::Member, "customer")).unwrap();
        store.flush(&path).unwrap();

        let mut reopened = MemorySchemaStore::open(&path).unwrap();
        assert_eq!(
            reopened.content_types(ContentKind::Member).unwrap(),
            store.content_types(ContentKind::Member).unwrap()
        );
        assert_eq!(reopened.total_saves(), 0);

        let mut next = named(ContentKind::Member, "partner");
        reopened.save(ContentKind::Member, &mut next).unwrap();
        assert_eq!(next.id, Some(ContentTypeId(2)));
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = MemorySchemaStore::open(&temp.path().join("missing.json")).unwrap();
        assert_eq!(store.len(ContentKind::Document), 0);
    }
}
