use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use plateful_core::error::LookupError;
use plateful_core::models::FoodMatch;
use plateful_core::nutritionix::{
    ErrorResponse, NATURAL_NUTRIENTS_URL, NutrientsRequest, NutrientsResponse, response_to_matches,
};
use plateful_core::resolver::NutritionLookup;

use crate::config::NutritionixCredentials;

pub struct NutritionixClient {
    client: reqwest::Client,
    endpoint: String,
    credentials: Option<NutritionixCredentials>,
}

impl NutritionixClient {
    pub fn new(credentials: Option<NutritionixCredentials>) -> Result<Self> {
        Self::with_endpoint(credentials, NATURAL_NUTRIENTS_URL)
    }

    pub fn with_endpoint(
        credentials: Option<NutritionixCredentials>,
        endpoint: &str,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "plateful-cli/{} (food log)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(std::time::Duration::from_secs(10))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            credentials,
        })
    }

    pub async fn natural_nutrients(&self, food_name: &str) -> Result<Vec<FoodMatch>, LookupError> {
        let Some(creds) = &self.credentials else {
            return Err(LookupError::Transport(
                "Nutritionix credentials not configured (set NUTRITIONIX_APP_ID and NUTRITIONIX_APP_KEY)"
                    .to_string(),
            ));
        };

        debug!(food = food_name, "querying Nutritionix");
        let resp = self
            .client
            .post(&self.endpoint)
            .header("x-app-id", &creds.app_id)
            .header("x-app-key", &creds.app_key)
            .json(&NutrientsRequest { query: food_name })
            .send()
            .await
            .map_err(|e| LookupError::Transport(format!("Failed to reach Nutritionix: {e}")))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound {
                query: food_name.to_string(),
            });
        }
        if !status.is_success() {
            let detail = resp
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| status.to_string());
            return Err(LookupError::Transport(format!(
                "Nutritionix returned {status}: {detail}"
            )));
        }

        let data: NutrientsResponse = resp.json().await.map_err(|e| {
            LookupError::Transport(format!("Failed to parse Nutritionix response: {e}"))
        })?;

        Ok(response_to_matches(data))
    }
}

#[async_trait]
impl NutritionLookup for NutritionixClient {
    async fn lookup(&self, food_name: &str) -> Result<Vec<FoodMatch>, LookupError> {
        self.natural_nutrients(food_name).await
    }
}
