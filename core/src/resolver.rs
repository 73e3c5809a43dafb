use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::CalorieCache;
use crate::cancel::CancellationToken;
use crate::error::{LookupError, ResolveError};
use crate::models::{CacheEntry, FoodMatch};

/// External nutrition data source, consulted on a cache miss.
///
/// The CLI implements this with reqwest against Nutritionix; tests use mocks.
#[async_trait]
pub trait NutritionLookup: Send + Sync {
    /// Look up a free-text food description. An empty vec means nothing matched.
    async fn lookup(&self, food_name: &str) -> Result<Vec<FoodMatch>, LookupError>;
}

/// Resolve a food name to calories, cache first.
///
/// A cache hit never calls `lookup`. On a miss the raw `food_name` is sent to
/// the collaborator and the first usable match is cached under the normalized
/// key. Failures leave the cache untouched.
pub async fn resolve(
    cache: &mut CalorieCache,
    lookup: &dyn NutritionLookup,
    food_name: &str,
    cancel: &CancellationToken,
) -> Result<CacheEntry, ResolveError> {
    if food_name.trim().is_empty() {
        return Err(ResolveError::EmptyFoodName);
    }

    if let Some(hit) = cache.get(food_name) {
        debug!(food = food_name, calories = hit.calories, "cache hit");
        return Ok(hit.clone());
    }

    if cancel.is_cancelled() {
        return Err(ResolveError::Cancelled);
    }

    debug!(food = food_name, "cache miss, calling nutrition lookup");
    let matches = tokio::select! {
        () = cancel.cancelled() => return Err(ResolveError::Cancelled),
        result = lookup.lookup(food_name) => result?,
    };

    let Some(entry) = matches.into_iter().next().and_then(match_to_entry) else {
        warn!(food = food_name, "lookup returned no usable result");
        return Err(ResolveError::NotFound {
            query: food_name.to_string(),
        });
    };

    cache
        .put(food_name, entry.clone())
        .map_err(ResolveError::Storage)?;
    Ok(entry)
}

/// Round to whole calories; negative or non-finite values are unusable.
#[allow(clippy::cast_sign_loss)]
fn match_to_entry(m: FoodMatch) -> Option<CacheEntry> {
    if !m.calories.is_finite() || m.calories < 0.0 {
        return None;
    }
    let calories = m.calories.round().min(f64::from(u32::MAX)) as u32;
    Some(CacheEntry {
        calories,
        category: m.name,
    })
}
