use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::aggregate::{CalorieMatrix, WeeklyChart, compute_totals};
use crate::cache::CalorieCache;
use crate::cancel::CancellationToken;
use crate::models::{Day, Entry, MealFilter, MealType};
use crate::resolver::{self, NutritionLookup};
use crate::storage::{KeyValueStore, MemoryStore, SqliteStore};
use crate::store::EntryStore;

/// The food log: entry store plus lookup cache over one storage backend.
///
/// Construct one per process and hand it to whatever drives user actions.
pub struct FoodLog {
    store: EntryStore,
    cache: CalorieCache,
}

impl FoodLog {
    pub fn new(db_path: &Path) -> Result<Self> {
        Self::with_storage(Arc::new(SqliteStore::open(db_path)?))
    }

    pub fn new_in_memory() -> Result<Self> {
        Self::with_storage(Arc::new(MemoryStore::new()))
    }

    pub fn with_storage(storage: Arc<dyn KeyValueStore>) -> Result<Self> {
        let store = EntryStore::load(storage.clone())?;
        let cache = CalorieCache::load(storage)?;
        Ok(Self { store, cache })
    }

    // --- Entries ---

    /// Resolve `food` to calories (cache first) and log it.
    ///
    /// Lookup failures come back as [`ResolveError`](crate::error::ResolveError)
    /// inside the `anyhow::Error` and never create an entry.
    pub async fn add_food(
        &mut self,
        lookup: &dyn NutritionLookup,
        food: &str,
        meal: MealType,
        day: Day,
        cancel: &CancellationToken,
    ) -> Result<Entry> {
        let food = food.trim();
        let resolved = resolver::resolve(&mut self.cache, lookup, food, cancel).await?;
        self.store.add_entry(food, meal, day, resolved.calories)
    }

    pub fn remove_entry(&mut self, id: u64) -> Result<bool> {
        self.store.remove_entry(id)
    }

    pub fn clear_all(&mut self) -> Result<()> {
        self.store.clear_all(&mut self.cache)
    }

    pub fn list_entries(&self, filter: MealFilter) -> impl Iterator<Item = &Entry> + Clone {
        self.store.list_entries(filter)
    }

    #[must_use]
    pub fn get_entry(&self, id: u64) -> Option<&Entry> {
        self.store.get(id)
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        self.store.entries()
    }

    // --- Totals ---

    #[must_use]
    pub fn totals(&self) -> CalorieMatrix {
        compute_totals(self.store.entries())
    }

    #[must_use]
    pub fn chart(&self) -> WeeklyChart {
        self.totals().chart()
    }

    // --- Cache ---

    #[must_use]
    pub fn cache(&self) -> &CalorieCache {
        &self.cache
    }

    pub fn clear_cache(&mut self) -> Result<()> {
        self.cache.clear()?;
        info!("cleared food cache");
        Ok(())
    }
}
