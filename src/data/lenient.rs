//! Serde helpers for stored records that tolerate unknown enumerated values.
//!
//! Stored lists of damage types, languages, skills and similar are decoded
//! entry by entry; an entry that does not decode is dropped rather than
//! failing the whole record.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

fn decode<T: DeserializeOwned>(value: &Value) -> Option<T> {
    match T::deserialize(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            debug!(%value, %err, "dropping unrecognised value");
            None
        }
    }
}

/// A list whose unknown entries are skipped. A missing or `null` list is empty.
pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw.iter().filter_map(decode).collect())
}

/// An optional value that becomes `None` when it does not decode.
pub fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(decode))
}

/// A value that falls back to its default when it does not decode.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(decode).unwrap_or_default())
}
