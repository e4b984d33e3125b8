//! Load the compendium from a document store. Graceful per-record fallback:
//! an undecodable record is skipped with a warning, while a missing
//! collection fails the load.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::data::compendium::Compendium;
use crate::data::store::{DocumentStore, MemoryStore, StoreResult};

pub const DEFAULT_SNAPSHOT_PATH: &str = "data/compendium.json";

/// Fetches all seven collections and decodes each record independently.
pub async fn load_compendium(store: &dyn DocumentStore) -> StoreResult<Compendium> {
    Ok(Compendium {
        actions: load_collection(store, "actions").await?,
        armors: load_collection(store, "armors").await?,
        occupations: load_collection(store, "occupations").await?,
        races: load_collection(store, "races").await?,
        subraces: load_collection(store, "subraces").await?,
        traits: load_collection(store, "traits").await?,
        weapons: load_collection(store, "weapons").await?,
    })
}

/// Reads a snapshot file into a [`MemoryStore`] and decodes it.
pub async fn load_snapshot(path: impl AsRef<Path>) -> StoreResult<(MemoryStore, Compendium)> {
    let store = MemoryStore::load(path).await?;
    let compendium = load_compendium(&store).await?;
    Ok((store, compendium))
}

async fn load_collection<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
) -> StoreResult<Vec<T>> {
    let raw = store.fetch_all(collection).await?;
    let total = raw.len();
    let mut records = Vec::with_capacity(total);
    for (index, value) in raw.into_iter().enumerate() {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("<no id>")
            .to_string();
        match serde_json::from_value::<T>(value) {
            Ok(record) => records.push(record),
            Err(err) => warn!(collection, index, %id, %err, "skipping undecodable record"),
        }
    }
    info!(
        collection,
        loaded = records.len(),
        skipped = total - records.len(),
        "loaded collection"
    );
    Ok(records)
}
