//! In-memory store holding encoded documents.

use super::{BoxFuture, Storage, StorageError, StorageResult, decode, encode, validate_name};
use crate::document::Document;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Keeps each drawing as its serialized bytes, so loads go through the same
/// parsing path as files do.
#[derive(Default)]
pub struct MemoryStorage {
    drawings: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bytes under `id` without checking that they parse.
    pub fn insert_raw(&self, id: &str, bytes: Vec<u8>) -> StorageResult<()> {
        let id = validate_name(id)?;
        self.drawings
            .write()
            .map_err(|_| StorageError::Poisoned)?
            .insert(id.to_string(), bytes);
        Ok(())
    }

    fn save_now(&self, id: &str, document: &Document) -> StorageResult<()> {
        self.insert_raw(id, encode(document)?)
    }

    fn load_now(&self, id: &str) -> StorageResult<Document> {
        let id = validate_name(id)?;
        let drawings = self.drawings.read().map_err(|_| StorageError::Poisoned)?;
        let bytes = drawings
            .get(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        decode(id, bytes)
    }
}

impl Storage for MemoryStorage {
    fn save(&self, id: &str, document: &Document) -> BoxFuture<'_, StorageResult<()>> {
        let result = self.save_now(id, document);
        Box::pin(async move { result })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Document>> {
        let result = self.load_now(id);
        Box::pin(async move { result })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let result = validate_name(id).and_then(|id| {
            self.drawings
                .write()
                .map_err(|_| StorageError::Poisoned)?
                .remove(id);
            Ok(())
        });
        Box::pin(async move { result })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let result = self
            .drawings
            .read()
            .map(|drawings| drawings.keys().cloned().collect())
            .map_err(|_| StorageError::Poisoned);
        Box::pin(async move { result })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let result = validate_name(id).and_then(|id| {
            let drawings = self.drawings.read().map_err(|_| StorageError::Poisoned)?;
            Ok(drawings.contains_key(id))
        });
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Envelope;
    use crate::{CanvasEngine, InputEvent};
    use pollster::block_on;

    #[test]
    fn test_engine_drawing_survives_store() {
        let mut engine = CanvasEngine::new();
        engine.handle_input(InputEvent::down(0.0, 0.0));
        engine.handle_input(InputEvent::moved(30.0, 40.0));
        engine.handle_input(InputEvent::PointerUp);

        let storage = MemoryStorage::new();
        block_on(storage.save("sketch", &engine.export_document().unwrap())).unwrap();

        let mut restored = CanvasEngine::new();
        restored.import_document(&block_on(storage.load("sketch")).unwrap());
        assert_eq!(restored.elements(), engine.elements());
    }

    #[test]
    fn test_unknown_envelopes_stored_verbatim() {
        let doc = Document {
            version: 2,
            elements: vec![Envelope::new("future-type", vec![7, 7])],
        };
        let storage = MemoryStorage::new();
        block_on(storage.save("future", &doc)).unwrap();
        assert_eq!(block_on(storage.load("future")).unwrap(), doc);
    }

    #[test]
    fn test_missing_and_corrupt() {
        let storage = MemoryStorage::new();
        assert!(matches!(
            block_on(storage.load("nothing")),
            Err(StorageError::NotFound(_))
        ));
        storage.insert_raw("broken", b"{ not json".to_vec()).unwrap();
        assert!(matches!(
            block_on(storage.load("broken")),
            Err(StorageError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_list_sorted_and_delete() {
        let storage = MemoryStorage::new();
        for id in ["b", "a", "c"] {
            block_on(storage.save(id, &Document::default())).unwrap();
        }
        assert_eq!(block_on(storage.list()).unwrap(), ["a", "b", "c"]);

        block_on(storage.delete("b")).unwrap();
        block_on(storage.delete("b")).unwrap();
        assert!(!block_on(storage.exists("b")).unwrap());
        assert!(block_on(storage.exists("c")).unwrap());
    }

    #[test]
    fn test_rejects_bad_names() {
        let storage = MemoryStorage::new();
        assert!(matches!(
            block_on(storage.save("../escape", &Document::default())),
            Err(StorageError::InvalidName(_))
        ));
    }
}
