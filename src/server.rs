//! HTTP control surface: thin adapters translating requests into calls on
//! the monitor service and the persistent store.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::service::MonitorService;
use crate::stats::StatsSnapshot;
use crate::types::SwapEvent;

/// Build the API router.
pub fn router(service: Arc<MonitorService>, cors_origins: &str) -> Router {
    Router::new()
        .route("/api/", get(root))
        .route("/api/stats", get(stats))
        .route("/api/start-monitoring", post(start_monitoring))
        .route("/api/stop-monitoring", post(stop_monitoring))
        .route("/api/transactions", get(recent_transactions))
        .route("/api/test-telegram", post(test_telegram))
        .layer(cors_layer(cors_origins))
        .with_state(service)
}

fn cors_layer(origins: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.trim() == "*" {
        return layer.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .split(',')
        .filter_map(|o| o.trim().parse().ok())
        .collect();
    layer.allow_origin(parsed)
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Ethereum Mempool Monitor API",
        "status": "running",
    }))
}

async fn stats(State(service): State<Arc<MonitorService>>) -> Json<StatsSnapshot> {
    Json(service.stats_snapshot())
}

async fn start_monitoring(State(service): State<Arc<MonitorService>>) -> Json<Value> {
    if service.start() {
        Json(json!({"message": "Monitoring started", "status": "starting"}))
    } else {
        Json(json!({"message": "Monitoring already active", "status": "running"}))
    }
}

async fn stop_monitoring(State(service): State<Arc<MonitorService>>) -> Json<Value> {
    if service.stop().await {
        Json(json!({"message": "Monitoring stopped", "status": "stopped"}))
    } else {
        Json(json!({"message": "Monitoring was not running", "status": "stopped"}))
    }
}

#[derive(Debug, Deserialize)]
struct RecentParams {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    50
}

async fn recent_transactions(
    State(service): State<Arc<MonitorService>>,
    Query(params): Query<RecentParams>,
) -> Result<Json<Vec<SwapEvent>>, (StatusCode, Json<Value>)> {
    match service.recent(params.limit.clamp(1, 500)).await {
        Ok(events) => Ok(Json(events)),
        Err(e) => {
            error!(error = %e, "failed to read recent transactions");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": "store unavailable"})),
            ))
        }
    }
}

async fn test_telegram(State(service): State<Arc<MonitorService>>) -> impl IntoResponse {
    if service.send_test_notification().await {
        (
            StatusCode::OK,
            Json(json!({"message": "Test message sent successfully", "status": "success"})),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "Failed to send test message"})),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorConfig;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_service() -> Arc<MonitorService> {
        let config = MonitorConfig {
            websocket_url: "ws://127.0.0.1:1".to_string(),
            pending_tx_subscription: "newPendingTransactions".to_string(),
            telegram_bot_token: "test-token".to_string(),
            telegram_chat_id: "1".to_string(),
            telegram_api_base: "http://127.0.0.1:1".to_string(),
            redis_url: "redis://127.0.0.1:1".to_string(),
            swap_list_key: "test:swaps".to_string(),
            max_stored_swaps: 10,
            store_timeout_seconds: 1,
            provider_timeout_seconds: 1,
            token_cache_size: 16,
            bind_addr: "127.0.0.1:0".to_string(),
            cors_origins: "*".to_string(),
        };
        Arc::new(MonitorService::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_root_endpoint() {
        let app = router(test_service(), "*");
        let resp = app
            .oneshot(Request::get("/api/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint_returns_counters() {
        let app = router(test_service(), "*");
        let resp = app
            .oneshot(Request::get("/api/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["total_transactions"], 0);
        assert_eq!(body["notifications_sent"], 0);
    }

    #[tokio::test]
    async fn test_transactions_endpoint_reports_store_outage() {
        let app = router(test_service(), "*");
        let resp = app
            .oneshot(
                Request::get("/api/transactions?limit=5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
