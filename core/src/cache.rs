use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::models::{CacheEntry, normalize_query};
use crate::snapshot::{self, CACHE_KEY, CacheMap};
use crate::storage::KeyValueStore;

/// Previously resolved calorie lookups, keyed by normalized query.
///
/// Keys are never evicted; only [`clear`](Self::clear) removes them.
pub struct CalorieCache {
    entries: CacheMap,
    storage: Arc<dyn KeyValueStore>,
}

impl CalorieCache {
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Result<Self> {
        let raw = storage.get(CACHE_KEY)?;
        let entries = snapshot::decode_cache(raw.as_deref())?;
        debug!(cached = entries.len(), "loaded food cache");
        Ok(Self { entries, storage })
    }

    #[must_use]
    pub fn get(&self, query: &str) -> Option<&CacheEntry> {
        self.entries.get(&normalize_query(query))
    }

    /// Store a result and persist the whole cache. The in-memory cache only
    /// changes if the write succeeds.
    pub fn put(&mut self, query: &str, entry: CacheEntry) -> Result<()> {
        let key = normalize_query(query);
        let mut next = self.entries.clone();
        next.insert(key.clone(), entry);
        self.storage
            .set(CACHE_KEY, &snapshot::encode_cache(&next)?)?;
        debug!(%key, "cached lookup result");
        self.entries = next;
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.storage.delete(CACHE_KEY)?;
        self.entries.clear();
        Ok(())
    }

    /// Drop the in-memory contents after the durable copy was removed elsewhere.
    pub(crate) fn forget_all(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached `(query, result)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CacheEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
