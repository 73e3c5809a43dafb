use serde::{Deserialize, Serialize};

use crate::models::FoodMatch;

pub const NATURAL_NUTRIENTS_URL: &str = "https://trackapi.nutritionix.com/v2/natural/nutrients";

#[derive(Debug, Serialize)]
pub struct NutrientsRequest<'a> {
    pub query: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct NutrientsResponse {
    #[serde(default)]
    pub foods: Vec<NutritionixFood>,
}

#[derive(Debug, Deserialize)]
pub struct NutritionixFood {
    pub food_name: Option<String>,
    pub nf_calories: Option<f64>,
}

/// Error body Nutritionix sends with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub message: Option<String>,
}

#[must_use]
pub fn food_to_match(f: NutritionixFood) -> Option<FoodMatch> {
    let name = f.food_name.filter(|n| !n.is_empty())?;
    let calories = f.nf_calories?;
    Some(FoodMatch { name, calories })
}

#[must_use]
pub fn response_to_matches(resp: NutrientsResponse) -> Vec<FoodMatch> {
    resp.foods.into_iter().filter_map(food_to_match).collect()
}
