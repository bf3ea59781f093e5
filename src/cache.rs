//! Key/record cache available to pipeline stages through the context.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

/// A cached record: an untyped key/value document.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Key → record store with bulk operations.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<Record>;

    /// One slot per requested key, `None` where the key is missing.
    fn multi_get(&self, keys: &[&str]) -> Vec<Option<Record>>;

    fn put(&self, key: &str, value: Record);

    fn put_all(&self, entries: HashMap<String, Record>);

    /// Insert only if `key` is vacant. Returns whether the value was stored.
    fn put_if_absent(&self, key: &str, value: Record) -> bool;

    fn has_key(&self, key: &str) -> bool;

    fn keys(&self) -> Vec<String>;

    fn values(&self) -> Vec<Record>;

    fn entries(&self) -> HashMap<String, Record>;

    fn size(&self) -> usize;

    fn delete(&self, keys: &[&str]);
}

/// In-process [`Cache`] backed by a concurrent map.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    inner: Arc<DashMap<String, Record>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<Record> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    fn multi_get(&self, keys: &[&str]) -> Vec<Option<Record>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    fn put(&self, key: &str, value: Record) {
        self.inner.insert(key.to_string(), value);
    }

    fn put_all(&self, entries: HashMap<String, Record>) {
        for (k, v) in entries {
            self.inner.insert(k, v);
        }
    }

    fn put_if_absent(&self, key: &str, value: Record) -> bool {
        match self.inner.entry(key.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    fn has_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    fn keys(&self) -> Vec<String> {
        self.inner.iter().map(|r| r.key().clone()).collect()
    }

    fn values(&self) -> Vec<Record> {
        self.inner.iter().map(|r| r.value().clone()).collect()
    }

    fn entries(&self) -> HashMap<String, Record> {
        self.inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    fn size(&self) -> usize {
        self.inner.len()
    }

    fn delete(&self, keys: &[&str]) {
        for key in keys {
            self.inner.remove(*key);
        }
    }
}
