//! In-memory entity cache keyed by protocol identifiers.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Mapping from a numeric entity id to a cached entity record.
///
/// Entities are held behind [`Arc`] so callers can keep a handle to what they
/// stored and later ask which id it lives under with
/// [`reverse_lookup`](Self::reverse_lookup). That lookup compares pointers,
/// not contents: two structurally equal values stored separately are
/// different entities.
#[derive(Debug)]
pub struct EntityCache<E> {
    entries: HashMap<i64, Arc<E>>,
}

impl<E> Default for EntityCache<E> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<E> Clone for EntityCache<E> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<E> EntityCache<E> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle to the entity cached under `id`.
    ///
    /// The returned [`Arc`] points at the stored allocation, so passing it to
    /// [`reverse_lookup`](Self::reverse_lookup) finds `id` again.
    pub fn get(&self, id: i64) -> Option<Arc<E>> {
        self.entries.get(&id).cloned()
    }

    /// Stores `entity` under `id`, returning whatever was there before.
    pub fn set(&mut self, id: i64, entity: Arc<E>) -> Option<Arc<E>> {
        self.entries.insert(id, entity)
    }

    /// Whether anything is cached under `id`.
    pub fn has(&self, id: i64) -> bool {
        self.entries.contains_key(&id)
    }

    /// Removes `id`; `true` if it was present.
    pub fn delete(&mut self, id: i64) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Handles to every cached entity, in no particular order.
    pub fn values(&self) -> Vec<Arc<E>> {
        self.entries.values().cloned().collect()
    }

    /// Iterates over `(id, entity)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &Arc<E>)> {
        self.entries.iter().map(|(id, entity)| (*id, entity))
    }

    /// Finds the id holding this exact allocation.
    pub fn reverse_lookup(&self, entity: &Arc<E>) -> Option<i64> {
        self.entries
            .iter()
            .find(|(_, stored)| Arc::ptr_eq(stored, entity))
            .map(|(id, _)| *id)
    }
}

impl<E: Serialize> EntityCache<E> {
    /// Serializes every entry into a JSON object keyed by the string form of the id.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut object = Map::with_capacity(self.entries.len());
        for (id, entity) in &self.entries {
            object.insert(id.to_string(), serde_json::to_value(&**entity)?);
        }
        serde_json::to_string(&Value::Object(object))
    }
}

impl<E: DeserializeOwned> EntityCache<E> {
    /// Parses a blob produced by [`to_json`](Self::to_json).
    ///
    /// Keys that are not integers are skipped.
    pub fn from_json(blob: &str) -> serde_json::Result<Self> {
        let raw: HashMap<String, E> = serde_json::from_str(blob)?;
        Ok(Self::from_entries(raw))
    }

    pub(crate) fn from_entries(raw: impl IntoIterator<Item = (String, E)>) -> Self {
        let entries = raw
            .into_iter()
            .filter_map(|(key, entity)| {
                key.parse::<i64>()
                    .ok()
                    .map(|id| (id, Arc::new(entity)))
            })
            .collect();
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reverse_lookup_matches_identity_not_equality() {
        let mut cache = EntityCache::new();
        let stored = Arc::new(json!({ "name": "x" }));
        cache.set(7, stored.clone());

        assert_eq!(cache.reverse_lookup(&stored), Some(7));
        assert_eq!(cache.reverse_lookup(&Arc::new(json!({ "name": "x" }))), None);
    }

    #[test]
    fn delete_reports_presence() {
        let mut cache = EntityCache::new();
        cache.set(1, Arc::new(json!(1)));

        assert!(cache.delete(1));
        assert!(!cache.delete(1));
        assert!(!cache.has(1));
    }

    #[test]
    fn json_blob_uses_string_keys() {
        let mut cache = EntityCache::new();
        cache.set(123456789, Arc::new(json!({ "first_name": "Ada" })));
        cache.set(-100, Arc::new(json!({ "title": "chan" })));

        let blob = cache.to_json().unwrap();
        let parsed: Value = serde_json::from_str(&blob).unwrap();
        assert_eq!(parsed["123456789"]["first_name"], "Ada");
        assert_eq!(parsed["-100"]["title"], "chan");

        let restored = EntityCache::<Value>::from_json(&blob).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(*restored.get(-100).unwrap(), json!({ "title": "chan" }));
    }

    #[test]
    fn from_json_skips_non_integer_keys() {
        let restored = EntityCache::<Value>::from_json(r#"{"12": 1, "abc": 2}"#).unwrap();
        assert_eq!(restored.len(), 1);
        assert!(restored.has(12));
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(EntityCache::<Value>::from_json("{not json").is_err());
    }
}
