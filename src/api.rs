// 🌐 REST API - read-only feeding cost endpoints over an immutable snapshot
//
// The snapshot is loaded before the listener binds and never changes, so
// handlers share it through an Arc without locking.

use crate::cost::PricingPolicy;
use crate::error::ZooError;
use crate::model::{AnimalRecord, PriceEntry};
use crate::pipeline::ZooSnapshot;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub snapshot: Arc<ZooSnapshot>,
    pub policy: PricingPolicy,
}

impl AppState {
    pub fn new(snapshot: ZooSnapshot, policy: PricingPolicy) -> Self {
        AppState {
            snapshot: Arc::new(snapshot),
            policy,
        }
    }
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCostResponse {
    pub total_daily_cost: Decimal,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalResponse {
    pub id: i64,
    pub name: String,
    pub species: String,
    pub weight: Decimal,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food_type: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    pub food_type: String,
    pub price: Decimal,
}

impl From<&AnimalRecord> for AnimalResponse {
    fn from(animal: &AnimalRecord) -> Self {
        Self {
            id: animal.id.unwrap_or_default(),
            name: animal.name.clone(),
            species: animal.species.name().to_string(),
            weight: animal.weight,
            resolved: animal.species.is_resolved(),
            food_type: animal.species.rule().map(|rule| rule.food_type.clone()),
        }
    }
}

impl From<&PriceEntry> for PriceResponse {
    fn from(entry: &PriceEntry) -> Self {
        Self {
            food_type: entry.food_type.clone(),
            price: entry.price,
        }
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// Unknown ids are 404; anything else (an overflowing figure) is 500.
fn error_response(e: ZooError) -> Response {
    let status = match e {
        ZooError::AnimalNotFound { .. } => StatusCode::NOT_FOUND,
        _ => {
            error!(error = %e, "cost calculation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(ApiResponse::<()>::err(e.to_string()))).into_response()
}

/// GET /api/zoo/getDailyCost - Total daily cost of feeding the whole zoo
async fn get_daily_cost(State(state): State<AppState>) -> Response {
    match state.snapshot.cost_engine(state.policy).total_daily_cost() {
        Ok(total_daily_cost) => {
            Json(ApiResponse::ok(DailyCostResponse { total_daily_cost })).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET /api/zoo/costs - Per-animal costs plus totals
async fn get_costs(State(state): State<AppState>) -> Response {
    match state.snapshot.cost_engine(state.policy).all_costs() {
        Ok(summary) => Json(ApiResponse::ok(summary)).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/zoo/costs/:id - Cost for a single animal
async fn get_cost_by_id(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.snapshot.cost_engine(state.policy).cost_for(id) {
        Ok(report) => (StatusCode::OK, Json(ApiResponse::ok(report))).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/zoo/animals - Inventory with resolution status
async fn get_animals(State(state): State<AppState>) -> impl IntoResponse {
    let response: Vec<AnimalResponse> = state
        .snapshot
        .animals()
        .iter()
        .map(AnimalResponse::from)
        .collect();

    Json(ApiResponse::ok(response))
}

/// GET /api/zoo/prices - Price list in file order
async fn get_prices(State(state): State<AppState>) -> impl IntoResponse {
    let response: Vec<PriceResponse> = state
        .snapshot
        .prices()
        .entries()
        .iter()
        .map(PriceResponse::from)
        .collect();

    Json(ApiResponse::ok(response))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/zoo/getDailyCost", get(get_daily_cost))
        .route("/zoo/costs", get(get_costs))
        .route("/zoo/costs/:id", get(get_cost_by_id))
        .route("/zoo/animals", get(get_animals))
        .route("/zoo/prices", get(get_prices))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnimalTypeRule;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_state(policy: PricingPolicy) -> AppState {
        let lion = Arc::new(AnimalTypeRule::new(
            "Lion".to_string(),
            Decimal::new(10, 2),
            "meat".to_string(),
            Decimal::ZERO,
        ));

        let animals = vec![
            AnimalRecord::new("Simba".to_string(), Decimal::from(160), "Lion".to_string())
                .with_id(1)
                .with_rule(Arc::clone(&lion)),
            AnimalRecord::new("Ghost".to_string(), Decimal::from(90), "Yeti".to_string()).with_id(2),
        ];

        let prices = vec![
            PriceEntry::new("Meat".to_string(), Decimal::new(1256, 2)),
            PriceEntry::new("Fruit".to_string(), Decimal::new(560, 2)),
        ];

        AppState::new(ZooSnapshot::from_parts(vec![lion], animals, prices), policy)
    }

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        get_json_from(test_state(PricingPolicy::FixedCategories), uri).await
    }

    async fn get_json_from(state: AppState, uri: &str) -> (StatusCode, Value) {
        let app = router(state);
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn decimal(value: &Value) -> Decimal {
        serde_json::from_value(value.clone()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], Value::Bool(true));
        assert_eq!(body["data"], Value::String("OK".to_string()));
    }

    #[tokio::test]
    async fn test_daily_cost_endpoint() {
        let (status, body) = get_json("/api/zoo/getDailyCost").await;

        assert_eq!(status, StatusCode::OK);
        // 160 × 0.10 × 12.56; the unresolved Yeti adds nothing
        assert_eq!(decimal(&body["data"]["totalDailyCost"]), Decimal::new(20096, 2));
    }

    #[tokio::test]
    async fn test_cost_by_id() {
        let (status, body) = get_json("/api/zoo/costs/1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["animalName"], Value::String("Simba".to_string()));
        assert_eq!(body["data"]["pricing"], Value::String("priced".to_string()));
        assert_eq!(decimal(&body["data"]["monthlyCost"]), Decimal::new(602880, 2));
    }

    #[tokio::test]
    async fn test_unknown_id_is_404() {
        let (status, body) = get_json("/api/zoo/costs/42").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], Value::Bool(false));
        assert!(body["error"].as_str().unwrap().contains("42"));
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn test_overflowing_cost_is_500() {
        let mammoth = Arc::new(AnimalTypeRule::new(
            "Mammoth".to_string(),
            Decimal::MAX,
            "meat".to_string(),
            Decimal::ZERO,
        ));
        let animals = vec![
            AnimalRecord::new("Jumbo".to_string(), Decimal::MAX, "Mammoth".to_string())
                .with_id(1)
                .with_rule(Arc::clone(&mammoth)),
        ];
        let prices = vec![PriceEntry::new("Meat".to_string(), Decimal::ONE)];
        let snapshot = ZooSnapshot::from_parts(vec![mammoth], animals, prices);

        for uri in ["/api/zoo/costs/1", "/api/zoo/costs", "/api/zoo/getDailyCost"] {
            let state = AppState::new(snapshot.clone(), PricingPolicy::FixedCategories);
            let (status, body) = get_json_from(state, uri).await;

            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);
            assert_eq!(body["success"], Value::Bool(false));
            assert!(body["error"].as_str().unwrap().contains("Jumbo"));
        }
    }

    #[tokio::test]
    async fn test_all_costs_flags_unresolved() {
        let (status, body) = get_json("/api/zoo/costs").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["animals"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"]["unpricedCount"], Value::from(1));
        assert_eq!(
            body["data"]["animals"][1]["pricing"],
            Value::String("unresolved_species".to_string())
        );
    }

    #[tokio::test]
    async fn test_animals_and_prices() {
        let (_, animals) = get_json("/api/zoo/animals").await;
        let (_, prices) = get_json("/api/zoo/prices").await;

        assert_eq!(animals["data"][0]["foodType"], Value::String("meat".to_string()));
        assert_eq!(animals["data"][1]["resolved"], Value::Bool(false));
        assert!(animals["data"][1].get("foodType").is_none());

        assert_eq!(prices["data"].as_array().unwrap().len(), 2);
        assert_eq!(prices["data"][0]["foodType"], Value::String("Meat".to_string()));
    }
}
