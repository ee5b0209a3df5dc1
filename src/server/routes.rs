use crate::errors::PricingError;
use crate::pricing::{PricingRequest, PricingResult};
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use portable_atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

/// Router shared by the binary and the in-crate HTTP tests. The timeout layer
/// bounds whole-request latency; the Monte Carlo trial cap bounds the work
/// itself.
pub fn router(state: Arc<AppState>) -> Router {
    let timeout = Duration::from_millis(state.config.request_timeout_ms);
    Router::new()
        .route("/pricing/calculate", post(calculate))
        .route("/pricing/monte-carlo", post(monte_carlo))
        .route("/pricing/health", get(health))
        .route("/pricing/counters", get(counters))
        .layer(tower_http::timeout::TimeoutLayer::new(timeout))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}

/// Pricing failures surface as a client-visible 400 with no partial result.
/// Pricing is a stateless, idempotent read, so callers may safely retry;
/// the service itself never does.
pub struct ApiError(PricingError);

impl From<PricingError> for ApiError {
    fn from(e: PricingError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

/// POST /pricing/calculate -- analytic quote (fast path)
pub async fn calculate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PricingRequest>,
) -> Result<Json<PricingResult>, ApiError> {
    let request_id = uuid::Uuid::new_v4();
    tracing::info!(
        request_id = %request_id,
        product = %request.product_type,
        "analytic pricing request"
    );

    let worker = state.clone();
    let result = tokio::task::spawn_blocking(move || worker.analytic.price(&request))
        .await
        .map_err(PricingError::from)
        .and_then(|r| r);

    match result {
        Ok(result) => {
            state.counters.analytic_requests.fetch_add(1, Ordering::Relaxed);
            Ok(Json(result))
        }
        Err(e) => {
            state.counters.pricing_errors.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(request_id = %request_id, error = %e, "analytic pricing failed");
            Err(ApiError(e))
        }
    }
}

/// POST /pricing/monte-carlo -- simulation quote (slow path, off the async
/// runtime via spawn_blocking)
pub async fn monte_carlo(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PricingRequest>,
) -> Result<Json<PricingResult>, ApiError> {
    let request_id = uuid::Uuid::new_v4();
    tracing::info!(
        request_id = %request_id,
        product = %request.product_type,
        num_simulations = ?request.num_simulations,
        "monte carlo pricing request"
    );

    let worker = state.clone();
    let result = tokio::task::spawn_blocking(move || worker.monte_carlo.price(&request))
        .await
        .map_err(PricingError::from)
        .and_then(|r| r);

    match result {
        Ok(result) => {
            state.counters.monte_carlo_requests.fetch_add(1, Ordering::Relaxed);
            state
                .counters
                .simulations_run
                .fetch_add(u64::from(result.num_simulations_used.unwrap_or(0)), Ordering::Relaxed);
            Ok(Json(result))
        }
        Err(e) => {
            state.counters.pricing_errors.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(request_id = %request_id, error = %e, "monte carlo pricing failed");
            Err(ApiError(e))
        }
    }
}

/// GET /pricing/health -- liveness probe
pub async fn health() -> &'static str {
    "Pricing engine is running"
}

/// GET /pricing/counters -- performance counters (lock-free reads)
pub async fn counters(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    use portable_atomic::Ordering::Relaxed;
    let uptime = (chrono::Utc::now() - state.started_at).num_seconds();
    Json(serde_json::json!({
        "analytic_requests": state.counters.analytic_requests.load(Relaxed),
        "monte_carlo_requests": state.counters.monte_carlo_requests.load(Relaxed),
        "simulations_run": state.counters.simulations_run.load(Relaxed),
        "pricing_errors": state.counters.pricing_errors.load(Relaxed),
        "started_at": state.started_at.to_rfc3339(),
        "uptime_seconds": uptime,
    }))
}
