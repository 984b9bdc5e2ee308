use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use crate::driver::{Heartbeat, Liveness};
use crate::metrics::InventoryMetrics;

pub const SERVICE_NAME: &str = "ecommerce-inventory-forecasting";
pub const SERVICE_DESCRIPTION: &str = "Real-time E-commerce Inventory & Demand Forecasting System";

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

#[derive(Clone)]
pub struct HttpState {
    pub metrics: Arc<InventoryMetrics>,
    pub heartbeat: Arc<Heartbeat>,
    pub log_path: String,
    pub tick_interval: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServiceDescriptor {
    pub service: &'static str,
    pub description: &'static str,
    pub metrics: &'static str,
    pub log_path: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ticks: u64,
    pub last_tick_at: Option<String>,
    pub checked_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub correlation_id: String,
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
}

pub async fn spawn(bind_address: &str, port: u16, state: HttpState) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.http.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "metrics and health endpoints started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(state)).await {
            error!(
                event_name = "system.http.error",
                correlation_id = "bootstrap",
                error = %error,
                "http server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn index(State(state): State<HttpState>) -> Json<ServiceDescriptor> {
    Json(ServiceDescriptor {
        service: SERVICE_NAME,
        description: SERVICE_DESCRIPTION,
        metrics: "/metrics",
        log_path: state.log_path,
    })
}

pub async fn health(State(state): State<HttpState>) -> (StatusCode, Json<HealthResponse>) {
    let now = Utc::now();
    let liveness = state.heartbeat.liveness(now, state.tick_interval);

    let payload = HealthResponse {
        status: match liveness {
            Liveness::Healthy => "healthy",
            Liveness::Stalled => "stalled",
        },
        ticks: state.heartbeat.ticks(),
        last_tick_at: state.heartbeat.last_tick_at().map(|at| at.to_rfc3339()),
        checked_at: now.to_rfc3339(),
    };

    let status_code = match liveness {
        Liveness::Healthy => StatusCode::OK,
        Liveness::Stalled => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(payload))
}

pub async fn metrics(State(state): State<HttpState>) -> Response {
    match state.metrics.gather_text() {
        Ok(body) => ([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], body).into_response(),
        Err(failure) => {
            let interface = failure.into_interface("metrics-scrape");
            error!(
                event_name = "system.http.metrics_failed",
                correlation_id = interface.correlation_id(),
                error = %interface,
                "metrics exposition failed"
            );
            let payload = ErrorResponse {
                error: interface.user_message(),
                correlation_id: interface.correlation_id().to_string(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        extract::State,
        http::{Request, StatusCode},
        Json,
    };
    use chrono::{Duration as ChronoDuration, Utc};
    use stockcast_core::domain::{ProductId, WarehouseId};
    use stockcast_core::telemetry::MetricUpdate;
    use tower::ServiceExt;

    use crate::driver::Heartbeat;
    use crate::http::{health, index, router, HttpState, SERVICE_NAME};
    use crate::metrics::InventoryMetrics;

    fn state_with(heartbeat: Heartbeat) -> HttpState {
        HttpState {
            metrics: Arc::new(InventoryMetrics::new().expect("registry should build")),
            heartbeat: Arc::new(heartbeat),
            log_path: "/var/log/app/events.jsonl".to_string(),
            tick_interval: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn index_describes_the_service() {
        let Json(payload) = index(State(state_with(Heartbeat::new(Utc::now())))).await;

        assert_eq!(payload.service, SERVICE_NAME);
        assert_eq!(payload.metrics, "/metrics");
        assert_eq!(payload.log_path, "/var/log/app/events.jsonl");
    }

    #[tokio::test]
    async fn health_is_ok_during_the_first_interval() {
        let (status, Json(payload)) = health(State(state_with(Heartbeat::new(Utc::now())))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "healthy");
        assert_eq!(payload.ticks, 0);
        assert_eq!(payload.last_tick_at, None);
    }

    #[tokio::test]
    async fn health_reports_recent_ticks() {
        let heartbeat = Heartbeat::new(Utc::now() - ChronoDuration::minutes(10));
        heartbeat.record(Utc::now());

        let (status, Json(payload)) = health(State(state_with(heartbeat))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.ticks, 1);
        assert!(payload.last_tick_at.is_some());
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_driver_stalls() {
        let heartbeat = Heartbeat::new(Utc::now() - ChronoDuration::minutes(10));
        heartbeat.record(Utc::now() - ChronoDuration::minutes(5));

        let (status, Json(payload)) = health(State(state_with(heartbeat))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "stalled");
    }

    #[tokio::test]
    async fn metrics_route_serves_prometheus_text() {
        let state = state_with(Heartbeat::new(Utc::now()));
        state.metrics.apply(&MetricUpdate::InventoryLevel {
            product_id: ProductId("PHONE-002".to_string()),
            warehouse_id: WarehouseId("WH-TYO".to_string()),
            units: 321,
        });

        let response = router(state)
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).expect("request"))
            .await
            .expect("router should respond");

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/plain"));

        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let text = String::from_utf8(body.to_vec()).expect("utf8 body");
        let series = "inventory_level_units{product_id=\"PHONE-002\",warehouse_id=\"WH-TYO\"}";
        assert!(text.contains(&format!("{series} 321")));
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        let response = router(state_with(Heartbeat::new(Utc::now())))
            .oneshot(Request::builder().uri("/orders").body(Body::empty()).expect("request"))
            .await
            .expect("router should respond");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
