//! Serialized forms of the entry list and the food cache.
//!
//! Both are written as complete JSON snapshots under fixed keys. The layout
//! matches what the browser widget kept in local storage, so exported data
//! from it can be loaded as-is.

use std::collections::BTreeMap;

use anyhow::{Context, Result};

use crate::models::{CacheEntry, Entry};

pub const ENTRIES_KEY: &str = "entries";
pub const CACHE_KEY: &str = "foodCache";

pub type CacheMap = BTreeMap<String, CacheEntry>;

pub fn encode_entries(entries: &[Entry]) -> Result<String> {
    serde_json::to_string(entries).context("Failed to serialize entries")
}

/// A missing snapshot is an empty list.
pub fn decode_entries(raw: Option<&str>) -> Result<Vec<Entry>> {
    match raw {
        None => Ok(Vec::new()),
        Some(json) => serde_json::from_str(json).context("Stored entries are not valid JSON"),
    }
}

pub fn encode_cache(cache: &CacheMap) -> Result<String> {
    serde_json::to_string(cache).context("Failed to serialize food cache")
}

/// A missing snapshot is an empty cache.
pub fn decode_cache(raw: Option<&str>) -> Result<CacheMap> {
    match raw {
        None => Ok(CacheMap::new()),
        Some(json) => serde_json::from_str(json).context("Stored food cache is not valid JSON"),
    }
}
