//! Failure types for calorie resolution.

use thiserror::Error;

/// Failure reported by a [`NutritionLookup`](crate::resolver::NutritionLookup) collaborator.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("No food data available for '{query}'")]
    NotFound { query: String },

    #[error("Food lookup failed: {0}")]
    Transport(String),
}

/// Why a food name could not be turned into a calorie count.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Please enter a food name")]
    EmptyFoodName,

    #[error("No food data available for '{query}'")]
    NotFound { query: String },

    #[error("Food lookup failed: {0}")]
    Transport(String),

    #[error("Food lookup was cancelled")]
    Cancelled,

    #[error("Failed to save the food cache")]
    Storage(#[source] anyhow::Error),
}

impl ResolveError {
    /// True for outcomes the user fixes by changing the query, not by retrying later.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::EmptyFoodName)
    }
}

impl From<LookupError> for ResolveError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound { query } => Self::NotFound { query },
            LookupError::Transport(msg) => Self::Transport(msg),
        }
    }
}
