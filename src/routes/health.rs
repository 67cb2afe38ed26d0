//! Health check endpoints for probes and monitoring.

use axum::{Json, extract::State, response::IntoResponse};
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Detailed health status response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Overall status: "healthy" or "unhealthy"
    pub status: String,
    pub version: String,
    pub database: ComponentStatus,
}

/// Status of a single component.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub healthy: bool,
    /// Latency of the probe in milliseconds
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Full health check: runs a trivial query through the configured backend.
#[tracing::instrument(name = "health.check", skip(state))]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = std::time::Instant::now();
    let result = state.db.health_check().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let database = match result {
        Ok(()) => ComponentStatus {
            healthy: true,
            latency_ms,
            message: None,
        },
        Err(e) => {
            tracing::warn!(backend = state.db.backend(), error = %e, "Database health check failed");
            ComponentStatus {
                healthy: false,
                latency_ms,
                message: Some("Database connection failed".to_string()),
            }
        }
    };

    let (status, status_code) = if database.healthy {
        ("healthy", StatusCode::OK)
    } else {
        ("unhealthy", StatusCode::SERVICE_UNAVAILABLE)
    };

    let health = HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
    };

    (status_code, Json(health))
}

/// Liveness probe. Succeeds whenever the process can serve requests.
#[tracing::instrument(name = "health.liveness")]
pub async fn liveness() -> impl IntoResponse {
    StatusCode::OK
}
