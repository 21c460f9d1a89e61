use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{BoxError, Json, Router};
use lagoon::{EngineState, PathResult, PathfindingMode, RouteRequest, RoutingEngine};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

type AppState = Arc<RoutingEngine>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModeBody {
    pub mode: PathfindingMode,
}

pub fn router(engine: Arc<RoutingEngine>, config: &ServerConfig) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(handle_error))
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .concurrency_limit(config.concurrency_limit.max(1));

    let router = Router::new()
        .route("/health", get(health))
        .route("/api/v1/route", post(route))
        .route("/api/v1/route/water-only", post(water_only_route))
        .route("/api/v1/calculate", post(calculate))
        .route("/api/v1/state", get(state))
        .route("/api/v1/mode", get(get_mode).put(set_mode))
        .layer(middleware)
        .layer(TraceLayer::new_for_http())
        .with_state(engine);

    if config.cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn handle_error(err: BoxError) -> (StatusCode, Json<serde_json::Value>) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(json!({ "success": false, "error": "request timed out" })),
        )
    } else {
        tracing::error!(error = %err, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "error": err.to_string() })),
        )
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn route(State(engine): State<AppState>, Json(request): Json<RouteRequest>) -> Json<PathResult> {
    let result = engine
        .find_path(&request.start_point, &request.end_point, request.mode)
        .await;
    tracing::debug!(success = result.success, fallback = result.is_fallback(), "route served");
    Json(result)
}

async fn water_only_route(
    State(engine): State<AppState>,
    Json(request): Json<RouteRequest>,
) -> Json<PathResult> {
    Json(
        engine
            .find_water_only_path(&request.start_point, &request.end_point, request.mode)
            .await,
    )
}

/// Starts a tracked calculation; progress is observable through `/api/v1/state`
async fn calculate(State(engine): State<AppState>, Json(request): Json<RouteRequest>) -> impl IntoResponse {
    tokio::spawn(async move {
        engine
            .calculate_route(request.start_point, request.end_point, request.mode)
            .await;
    });
    (StatusCode::ACCEPTED, Json(json!({ "accepted": true })))
}

async fn state(State(engine): State<AppState>) -> Json<EngineState> {
    Json(engine.get_state().await)
}

async fn get_mode(State(engine): State<AppState>) -> Json<ModeBody> {
    Json(ModeBody {
        mode: engine.pathfinding_mode().await,
    })
}

async fn set_mode(State(engine): State<AppState>, Json(body): Json<ModeBody>) -> Json<ModeBody> {
    engine.set_pathfinding_mode(body.mode).await;
    Json(ModeBody {
        mode: engine.pathfinding_mode().await,
    })
}
