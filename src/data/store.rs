//! Document-store boundary: the three operations the engine needs from a
//! persistence backend, plus an in-memory implementation backed by a JSON
//! snapshot file.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::data::compendium::Compendium;

/// Collections the loader reads.
pub const COLLECTIONS: [&str; 7] = [
    "actions",
    "armors",
    "occupations",
    "races",
    "subraces",
    "traits",
    "weapons",
];

/// Field map written by [`DocumentStore::put`].
pub type Fields = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("collection `{0}` does not exist")]
    MissingCollection(String),

    #[error("store backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every raw record in `collection`. A collection that does not exist is
    /// an error; an empty one is not.
    async fn fetch_all(&self, collection: &str) -> StoreResult<Vec<Value>>;

    /// The record with `id`, or `None` when absent.
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Merges `fields` into the record with `id`, creating it when absent.
    async fn put(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()>;
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

/// Store held entirely in memory. Collections are JSON arrays of records,
/// each carrying an `id` field.
#[derive(Debug)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, Vec<Value>>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// A store with every loader collection present and empty.
    pub fn new() -> Self {
        let collections = COLLECTIONS
            .iter()
            .map(|name| (name.to_string(), Vec::new()))
            .collect();
        Self {
            collections: RwLock::new(collections),
            writes: AtomicUsize::new(0),
        }
    }

    /// Builds a store from a snapshot object mapping collection names to
    /// arrays. Keys whose value is not an array are ignored.
    pub fn from_snapshot(snapshot: Value) -> StoreResult<Self> {
        let Value::Object(entries) = snapshot else {
            return Err(StoreError::Backend(
                "snapshot must be a JSON object of collections".to_string(),
            ));
        };
        let collections = entries
            .into_iter()
            .filter_map(|(name, records)| match records {
                Value::Array(records) => Some((name, records)),
                _ => None,
            })
            .collect();
        Ok(Self {
            collections: RwLock::new(collections),
            writes: AtomicUsize::new(0),
        })
    }

    pub fn from_compendium(compendium: &Compendium) -> StoreResult<Self> {
        Self::from_snapshot(serde_json::to_value(compendium)?)
    }

    pub async fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_snapshot(serde_json::from_str(&raw)?)
    }

    pub async fn snapshot(&self) -> Value {
        let collections = self.collections.read().await;
        Value::Object(
            collections
                .iter()
                .map(|(name, records)| (name.clone(), Value::Array(records.clone())))
                .collect(),
        )
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        let body = serde_json::to_string_pretty(&self.snapshot().await)?;
        tokio::fs::write(path, body).await?;
        Ok(())
    }

    /// Number of successful `put` calls since construction.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch_all(&self, collection: &str) -> StoreResult<Vec<Value>> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .cloned()
            .ok_or_else(|| StoreError::MissingCollection(collection.to_string()))
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        let collections = self.collections.read().await;
        let records = collections
            .get(collection)
            .ok_or_else(|| StoreError::MissingCollection(collection.to_string()))?;
        Ok(records.iter().find(|r| record_id(r) == Some(id)).cloned())
    }

    async fn put(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let records = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::MissingCollection(collection.to_string()))?;

        match records.iter_mut().find(|r| record_id(r) == Some(id)) {
            Some(Value::Object(existing)) => existing.extend(fields),
            Some(_) => {
                return Err(StoreError::Backend(format!(
                    "record `{id}` in `{collection}` is not an object"
                )))
            }
            None => {
                let mut record = Map::new();
                record.insert("id".to_string(), Value::String(id.to_string()));
                record.extend(fields);
                records.push(Value::Object(record));
            }
        }
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
