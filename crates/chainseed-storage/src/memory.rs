//! In-memory document store.

use chainseed_core::{Collection, DocumentStore, StoreError};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Value>>>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self, collection: Collection) -> usize {
        self.collections.read().get(&collection).map_or(0, Vec::len)
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn ping(&self) -> Result<(), StoreError> {
        self.ensure_open()
    }

    fn delete_all(&self, collection: Collection) -> Result<usize, StoreError> {
        self.ensure_open()?;
        Ok(self
            .collections
            .write()
            .remove(&collection)
            .map_or(0, |docs| docs.len()))
    }

    fn insert_many(&self, collection: Collection, docs: Vec<Value>) -> Result<usize, StoreError> {
        self.ensure_open()?;
        let inserted = docs.len();
        self.collections
            .write()
            .entry(collection)
            .or_default()
            .extend(docs);
        Ok(inserted)
    }

    fn find_all(&self, collection: Collection) -> Result<Vec<Value>, StoreError> {
        self.ensure_open()?;
        Ok(self
            .collections
            .read()
            .get(&collection)
            .cloned()
            .unwrap_or_default())
    }

    fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
