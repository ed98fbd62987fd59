//! Service identity and health endpoints.

use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;
use tracing::warn;

use super::{ApiResponse, AppState, HealthDto, RootDto};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// # Endpoint
/// `GET /`
pub async fn root() -> Json<RootDto> {
    Json(RootDto {
        message: "Media catalog API",
        version: VERSION,
        status: "running",
    })
}

/// Liveness plus a database round trip.
///
/// # Endpoint
/// `GET /health`
///
/// Answers 503 with `status: "degraded"` when the database is unreachable.
pub async fn health(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ApiResponse<HealthDto>>) {
    let database_ok = match state.store().ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Health check database ping failed");
            false
        }
    };

    let dto = HealthDto {
        status: if database_ok { "ok" } else { "degraded" },
        database: if database_ok { "connected" } else { "unavailable" },
        uptime_seconds: state.start_time.elapsed().as_secs(),
        active_scans: state.scanner().active_scan_count().await,
        version: VERSION,
    };

    let status = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(ApiResponse::success(dto)))
}
