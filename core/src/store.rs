use std::sync::Arc;

use anyhow::Result;
use rand::Rng;
use tracing::{debug, info};

use crate::cache::CalorieCache;
use crate::models::{Day, Entry, MealFilter, MealType};
use crate::snapshot::{self, CACHE_KEY, ENTRIES_KEY};
use crate::storage::KeyValueStore;

/// Upper bound (exclusive) for generated entry ids.
pub const ID_SPACE: u64 = 100_000_000;

/// The ordered log of food entries.
///
/// Insertion order is the only order kept. Every mutation rewrites the full
/// snapshot and only touches memory once that write succeeded.
pub struct EntryStore {
    entries: Vec<Entry>,
    storage: Arc<dyn KeyValueStore>,
}

impl EntryStore {
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Result<Self> {
        let raw = storage.get(ENTRIES_KEY)?;
        let entries = snapshot::decode_entries(raw.as_deref())?;
        debug!(entries = entries.len(), "loaded entry store");
        Ok(Self { entries, storage })
    }

    /// Append a new entry under a fresh id and persist the store.
    ///
    /// The caller is responsible for a non-empty `food`.
    pub fn add_entry(
        &mut self,
        food: &str,
        meal: MealType,
        day: Day,
        calories: u32,
    ) -> Result<Entry> {
        let entry = Entry {
            id: self.fresh_id(),
            food: food.to_string(),
            calories,
            meal,
            day,
        };

        let mut next = self.entries.clone();
        next.push(entry.clone());
        self.persist(&next)?;
        self.entries = next;

        info!(id = entry.id, food = %entry.food, %meal, %day, calories, "added entry");
        Ok(entry)
    }

    /// Remove the entry with `id`. Returns false (and writes nothing) when absent.
    pub fn remove_entry(&mut self, id: u64) -> Result<bool> {
        let Some(pos) = self.entries.iter().position(|e| e.id == id) else {
            debug!(id, "remove_entry: no such entry");
            return Ok(false);
        };

        let mut next = self.entries.clone();
        next.remove(pos);
        self.persist(&next)?;
        self.entries = next;

        info!(id, "removed entry");
        Ok(true)
    }

    /// Empty the store and the lookup cache together.
    ///
    /// Both durable keys are removed in one `delete_many` call; memory is
    /// only cleared after that succeeds.
    pub fn clear_all(&mut self, cache: &mut CalorieCache) -> Result<()> {
        self.storage.delete_many(&[ENTRIES_KEY, CACHE_KEY])?;
        self.entries.clear();
        cache.forget_all();
        info!("cleared all entries and the food cache");
        Ok(())
    }

    /// Entries matching `filter`, in insertion order.
    ///
    /// The iterator is lazy and `Clone`, so a view can walk it more than once.
    pub fn list_entries(&self, filter: MealFilter) -> impl Iterator<Item = &Entry> + Clone {
        self.entries.iter().filter(move |e| filter.matches(e))
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self, entries: &[Entry]) -> Result<()> {
        self.storage
            .set(ENTRIES_KEY, &snapshot::encode_entries(entries)?)
    }

    /// Random id in `0..ID_SPACE`, redrawn until it is not already taken.
    fn fresh_id(&self) -> u64 {
        let mut rng = rand::rng();
        loop {
            let id = rng.random_range(0..ID_SPACE);
            if self.get(id).is_none() {
                return id;
            }
        }
    }
}
