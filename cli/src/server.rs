use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};

use plateful_core::aggregate::{CalorieMatrix, WeeklyChart};
use plateful_core::cancel::CancellationToken;
use plateful_core::error::ResolveError;
use plateful_core::models::{Day, Entry, MealFilter, MealType};
use plateful_core::resolver::NutritionLookup;
use plateful_core::service::FoodLog;

const BODY_LIMIT: usize = 16 * 1024; // 16 KB

#[derive(Clone)]
struct AppState {
    // Held across the lookup await, so adds are serialized.
    log: Arc<Mutex<FoodLog>>,
    lookup: Arc<dyn NutritionLookup>,
    api_key: Option<String>,
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct CreateEntryRequest {
    food: String,
    meal: String,
    /// Defaults to today's weekday.
    day: Option<String>,
}

#[derive(Deserialize)]
struct ListQuery {
    meal: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    BadGateway(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            Self::Internal(err) => {
                error!("internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let mapped = match err.downcast_ref::<ResolveError>() {
            Some(ResolveError::EmptyFoodName) => Some(Self::BadRequest(
                ResolveError::EmptyFoodName.to_string(),
            )),
            Some(e @ ResolveError::NotFound { .. }) => Some(Self::NotFound(e.to_string())),
            Some(e @ ResolveError::Transport(_)) => Some(Self::BadGateway(e.to_string())),
            _ => None,
        };
        mapped.unwrap_or(Self::Internal(err))
    }
}

// --- Middleware ---

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(ref expected_key) = state.api_key {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected_key);

        if !authorized {
            warn!(uri = %request.uri(), "rejected request without valid API key");
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key".to_string(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Handlers ---

async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Entry>>, ApiError> {
    let filter = match query.meal.as_deref() {
        None => MealFilter::All,
        Some(meal) => meal
            .parse::<MealFilter>()
            .map_err(|e| ApiError::BadRequest(format!("{e}")))?,
    };

    let log = state.log.lock().await;
    Ok(Json(log.list_entries(filter).cloned().collect()))
}

async fn create_entry(
    State(state): State<AppState>,
    Json(req): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<Entry>), ApiError> {
    let meal: MealType = req
        .meal
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("{e}")))?;
    let day = match req.day.as_deref() {
        None | Some("today") => Day::from_weekday(Local::now().weekday()),
        Some(day) => day
            .parse()
            .map_err(|e| ApiError::BadRequest(format!("{e}")))?,
    };

    let mut log = state.log.lock().await;
    let entry = log
        .add_food(
            state.lookup.as_ref(),
            &req.food,
            meal,
            day,
            &CancellationToken::new(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    let mut log = state.log.lock().await;
    if log.remove_entry(id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Entry {id} not found")))
    }
}

async fn clear_entries(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    let mut log = state.log.lock().await;
    log.clear_all()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_totals(State(state): State<AppState>) -> Json<CalorieMatrix> {
    let log = state.log.lock().await;
    Json(log.totals())
}

async fn get_chart(State(state): State<AppState>) -> Json<WeeklyChart> {
    let log = state.log.lock().await;
    Json(log.chart())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/entries",
            get(list_entries).post(create_entry).delete(clear_entries),
        )
        .route("/api/entries/{id}", delete(delete_entry))
        .route("/api/totals", get(get_totals))
        .route("/api/chart", get(get_chart))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

/// First and last four characters of the key, or a mask when it is too short to abbreviate.
fn key_hint(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

pub async fn start_server(
    log: FoodLog,
    lookup: Arc<dyn NutritionLookup>,
    port: u16,
    bind: &str,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let state = AppState {
        log: Arc::new(Mutex::new(log)),
        lookup,
        api_key: api_key.clone(),
    };

    let app = build_router(state);

    if let Some(ref key) = api_key {
        let hint = key_hint(key);
        eprintln!("API key: {hint} (see api_key file in data directory)");
    } else {
        eprintln!("Warning: Authentication disabled (--no-auth). API is open to anyone.");
    }

    if bind != "127.0.0.1" && bind != "localhost" && api_key.is_none() {
        eprintln!(
            "Warning: Listening on {bind} with no authentication. Any device on your network can access this API."
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    info!(bind, port, "server listening");
    eprintln!("Listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use plateful_core::error::LookupError;
    use plateful_core::models::FoodMatch;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    /// Knows bananas and apples; the word "offline" simulates a network failure.
    #[derive(Default)]
    struct StubLookup {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl NutritionLookup for StubLookup {
        async fn lookup(&self, food_name: &str) -> Result<Vec<FoodMatch>, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let calories = match food_name {
                "banana" => 105.4,
                "apple" => 94.6,
                "offline" => return Err(LookupError::Transport("connection refused".into())),
                _ => {
                    return Err(LookupError::NotFound {
                        query: food_name.to_string(),
                    });
                }
            };
            Ok(vec![FoodMatch {
                name: food_name.to_string(),
                calories,
            }])
        }
    }

    fn test_state(api_key: Option<String>) -> AppState {
        AppState {
            log: Arc::new(Mutex::new(FoodLog::new_in_memory().unwrap())),
            lookup: Arc::new(StubLookup::default()),
            api_key,
        }
    }

    fn test_app(api_key: Option<String>) -> Router {
        build_router(test_state(api_key))
    }

    fn post_entry(body: &serde_json::Value) -> axum::http::Request<Body> {
        axum::http::Request::post("/api/entries")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn auth_missing_key_returns_401() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/entries")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Invalid or missing API key");
    }

    #[tokio::test]
    async fn auth_wrong_key_returns_401() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/entries")
                    .header("Authorization", "Bearer wrong-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn auth_correct_key_succeeds() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/entries")
                    .header("Authorization", "Bearer test-key-abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn security_headers_present() {
        let app = test_app(None);

        let response = app
            .oneshot(
                axum::http::Request::get("/api/totals")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
        assert_eq!(
            response.headers().get("content-security-policy").unwrap(),
            "default-src 'none'"
        );
    }

    #[tokio::test]
    async fn security_headers_on_auth_failure() {
        let app = test_app(Some("secret".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/chart")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
    }

    #[tokio::test]
    async fn body_size_limit_rejects_oversized() {
        let app = test_app(None);

        let big_body = vec![0u8; BODY_LIMIT + 1];
        let response = app
            .oneshot(
                axum::http::Request::post("/api/entries")
                    .header("content-type", "application/json")
                    .body(Body::from(big_body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn internal_error_does_not_leak_details() {
        let error = ApiError::Internal(anyhow::anyhow!("secret path /home/user/.plateful/db"));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Internal server error");
    }

    #[test]
    fn key_hint_abbreviates_long_keys() {
        assert_eq!(key_hint("0123456789abcdef"), "0123...cdef");
        assert_eq!(key_hint("schlüssel-äöü"), "schl...-äöü");
    }

    #[test]
    fn key_hint_masks_short_keys() {
        assert_eq!(key_hint("abc"), "****");
        assert_eq!(key_hint("ééé"), "****");
        assert_eq!(key_hint(""), "****");
    }

    #[tokio::test]
    async fn create_list_and_total_entries() {
        let state = test_state(None);
        let app = build_router(state.clone());

        for meal in ["breakfast", "lunch"] {
            let response = app
                .clone()
                .oneshot(post_entry(
                    &serde_json::json!({ "food": "banana", "meal": meal, "day": "Monday" }),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
            let json = body_json(response).await;
            assert_eq!(json["calories"], 105);
            assert_eq!(json["food"], "banana");
        }

        let response = app
            .clone()
            .oneshot(
                axum::http::Request::get("/api/entries?meal=lunch")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["meal"], "Lunch");

        let response = app
            .oneshot(
                axum::http::Request::get("/api/totals")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["totals"][0][0], 105);
        assert_eq!(json["totals"][1][0], 105);

        let log = state.log.lock().await;
        assert_eq!(log.totals().day_total(Day::Monday), 210);
    }

    #[tokio::test]
    async fn create_unknown_food_returns_404_and_logs_nothing() {
        let state = test_state(None);
        let app = build_router(state.clone());

        let response = app
            .oneshot(post_entry(
                &serde_json::json!({ "food": "unobtainium", "meal": "dinner", "day": "fri" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(state.log.lock().await.entries().is_empty());
    }

    #[tokio::test]
    async fn create_transport_failure_returns_502() {
        let app = test_app(None);

        let response = app
            .oneshot(post_entry(
                &serde_json::json!({ "food": "offline", "meal": "dinner", "day": "fri" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn create_rejects_bad_input() {
        let app = test_app(None);

        let response = app
            .clone()
            .oneshot(post_entry(
                &serde_json::json!({ "food": "banana", "meal": "brunch", "day": "Monday" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(post_entry(
                &serde_json::json!({ "food": "banana", "meal": "lunch", "day": "Someday" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(post_entry(
                &serde_json::json!({ "food": "   ", "meal": "lunch", "day": "Monday" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_entry_then_unknown_is_404() {
        let state = test_state(None);
        let app = build_router(state.clone());

        let response = app
            .clone()
            .oneshot(post_entry(
                &serde_json::json!({ "food": "apple", "meal": "dinner", "day": "Sunday" }),
            ))
            .await
            .unwrap();
        let id = body_json(response).await["id"].as_u64().unwrap();

        let uri = format!("/api/entries/{id}");
        let response = app
            .clone()
            .oneshot(
                axum::http::Request::delete(uri.as_str())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(
                axum::http::Request::delete(uri.as_str())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(state.log.lock().await.totals().is_zero());
    }

    #[tokio::test]
    async fn clear_entries_empties_log_and_chart() {
        let state = test_state(None);
        let app = build_router(state.clone());

        app.clone()
            .oneshot(post_entry(
                &serde_json::json!({ "food": "banana", "meal": "lunch", "day": "Tuesday" }),
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(
                axum::http::Request::delete("/api/entries")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(
                axum::http::Request::get("/api/chart")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["title"], "Weekly Calorie Intake");
        assert_eq!(json["labels"][0], "Monday");
        for dataset in json["datasets"].as_array().unwrap() {
            assert!(dataset["data"].as_array().unwrap().iter().all(|v| v == 0));
        }
        assert!(state.log.lock().await.cache().is_empty());
    }
}
