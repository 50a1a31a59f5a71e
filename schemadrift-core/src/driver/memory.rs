// schemadrift-core/src/driver/memory.rs
//! In-memory collection driver
//!
//! Behaves like a small MongoDB database for the operations the audit
//! needs: collections hold documents and raw index records, every
//! collection gets the `_id_` index on creation, index names and key
//! patterns are unique per collection, and creating an index on a missing
//! collection creates the collection.
//!
//! Cloning a `MemoryDriver` shares the underlying database, so a test can
//! hand one clone to the audit and inspect the other afterwards.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

use super::filter::matches_filter;
use super::CollectionDriver;
use crate::error::{DriftError, Result};
use crate::index::IndexDefinition;

struct MemoryCollection {
    name: String,
    documents: Vec<Value>,
    /// Raw listing records, in creation order
    indexes: Vec<Value>,
}

impl MemoryCollection {
    fn new(name: &str) -> Self {
        MemoryCollection {
            name: name.to_string(),
            documents: Vec::new(),
            indexes: vec![json!({"v": 2, "key": {"_id": 1}, "name": "_id_"})],
        }
    }

    fn index_position(&self, name: &str) -> Option<usize> {
        self.indexes
            .iter()
            .position(|record| record.get("name").and_then(Value::as_str) == Some(name))
    }
}

#[derive(Default)]
struct MemoryDatabase {
    collections: Vec<MemoryCollection>,
    /// Index names whose build always fails
    rejected_indexes: HashSet<String>,
}

impl MemoryDatabase {
    fn get(&self, name: &str) -> Option<&MemoryCollection> {
        self.collections.iter().find(|c| c.name == name)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut MemoryCollection> {
        self.collections.iter_mut().find(|c| c.name == name)
    }

    fn get_or_create(&mut self, name: &str) -> &mut MemoryCollection {
        match self.collections.iter().position(|c| c.name == name) {
            Some(pos) => &mut self.collections[pos],
            None => {
                self.collections.push(MemoryCollection::new(name));
                let last = self.collections.len() - 1;
                &mut self.collections[last]
            }
        }
    }
}

/// In-memory database bound to one database name
#[derive(Clone)]
pub struct MemoryDriver {
    database_name: String,
    inner: Arc<RwLock<MemoryDatabase>>,
}

impl MemoryDriver {
    /// Create an empty database
    pub fn new(database_name: impl Into<String>) -> Self {
        MemoryDriver {
            database_name: database_name.into(),
            inner: Arc::new(RwLock::new(MemoryDatabase::default())),
        }
    }

    /// Create a collection (with its `_id_` index) if it does not exist yet
    pub fn create_collection(&self, name: &str) {
        self.inner.write().get_or_create(name);
    }

    /// Insert a document, creating the collection on first use
    pub fn insert_document(&self, collection: &str, document: Value) {
        self.inner.write().get_or_create(collection).documents.push(document);
    }

    /// Append a raw index record verbatim, bypassing all validation
    ///
    /// Used to seed listings with records a real server could report,
    /// including malformed ones.
    pub fn insert_raw_index(&self, collection: &str, record: Value) {
        self.inner.write().get_or_create(collection).indexes.push(record);
    }

    /// Make every later attempt to build an index called `name` fail
    pub fn reject_index(&self, name: &str) {
        self.inner.write().rejected_indexes.insert(name.to_string());
    }

    /// Decoded index definitions of a collection, in listing order
    ///
    /// Records that do not decode are skipped.
    pub fn index_definitions(&self, collection: &str) -> Vec<IndexDefinition> {
        let db = self.inner.read();
        db.get(collection)
            .map(|c| {
                c.indexes
                    .iter()
                    .filter_map(|record| IndexDefinition::from_raw(record).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn has_collection(&self, name: &str) -> bool {
        self.inner.read().get(name).is_some()
    }
}

#[async_trait]
impl CollectionDriver for MemoryDriver {
    fn database_name(&self) -> &str {
        &self.database_name
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        Ok(self
            .inner
            .read()
            .collections
            .iter()
            .map(|c| c.name.clone())
            .collect())
    }

    async fn count_documents(&self, collection: &str, filter: &Value) -> Result<u64> {
        let db = self.inner.read();
        let coll = db
            .get(collection)
            .ok_or_else(|| DriftError::CollectionNotFound(collection.to_string()))?;

        let mut count = 0;
        for doc in &coll.documents {
            if matches_filter(doc, filter)? {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn list_indexes(&self, collection: &str) -> Result<Vec<Value>> {
        let db = self.inner.read();
        db.get(collection)
            .map(|c| c.indexes.clone())
            .ok_or_else(|| DriftError::CollectionNotFound(collection.to_string()))
    }

    async fn create_collection(&self, collection: &str) -> Result<()> {
        self.inner.write().get_or_create(collection);
        Ok(())
    }

    async fn create_index(&self, collection: &str, index: &IndexDefinition) -> Result<()> {
        let mut db = self.inner.write();

        if db.rejected_indexes.contains(&index.name) {
            return Err(DriftError::Driver(format!(
                "index build failed for '{}' on '{}'",
                index.name, collection
            )));
        }

        let coll = db.get_or_create(collection);
        if coll.index_position(&index.name).is_some() {
            return Err(DriftError::IndexExists(index.name.clone()));
        }

        let key_taken = coll
            .indexes
            .iter()
            .filter_map(|record| IndexDefinition::from_raw(record).ok())
            .any(|existing| existing.keys == index.keys);
        if key_taken {
            return Err(DriftError::IndexExists(format!(
                "an index with key {} already exists on '{}'",
                index.keys, collection
            )));
        }

        let mut record = index.to_document()?;
        if let Value::Object(map) = &mut record {
            map.insert("v".to_string(), json!(2));
        }
        coll.indexes.push(record);
        Ok(())
    }

    async fn drop_index(&self, collection: &str, name: &str) -> Result<()> {
        let mut db = self.inner.write();
        let coll = db
            .get_mut(collection)
            .ok_or_else(|| DriftError::CollectionNotFound(collection.to_string()))?;

        if name == "_id_" {
            return Err(DriftError::Driver("cannot drop _id index".to_string()));
        }

        let pos = coll
            .index_position(name)
            .ok_or_else(|| DriftError::IndexNotFound(name.to_string()))?;
        coll.indexes.remove(pos);
        Ok(())
    }
}
