//! HTTP handlers.
//!
//! Health routes answer with the raw report and a 200/503 status so
//! orchestrators can use them directly as liveness endpoints. The
//! `/api/v1` routes use the `ApiResponse` envelope.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use twinprobe_health::{HealthMonitor, ProbeStatus, ReportEntry};
use twinprobe_request::RequestError;

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

fn health_status_code(healthy: bool) -> StatusCode {
    if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

// ── Health ─────────────────────────────────────────────────────

/// GET /healthz
///
/// Serves the monitor's latest report, evaluating once if no cycle has
/// completed yet.
pub async fn health_report(State(monitor): State<Arc<HealthMonitor>>) -> impl IntoResponse {
    let report = match monitor.latest().await {
        Some(report) => report,
        None => monitor.refresh(CancellationToken::new()).await,
    };
    (health_status_code(report.is_healthy()), Json(report))
}

/// GET /healthz/{probe}
pub async fn probe_report(
    State(monitor): State<Arc<HealthMonitor>>,
    Path(probe): Path<String>,
) -> Response {
    match monitor.check_probe(&probe, CancellationToken::new()).await {
        Some(result) => (
            health_status_code(result.is_healthy()),
            Json(ReportEntry {
                name: probe,
                result,
            }),
        )
            .into_response(),
        None => error_response("probe not found", StatusCode::NOT_FOUND).into_response(),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusBody {
    pub status: ProbeStatus,
}

/// GET /health/health (plugin side)
pub async fn plugin_health(State(monitor): State<Arc<HealthMonitor>>) -> impl IntoResponse {
    let report = monitor.check_now(CancellationToken::new()).await;
    (
        health_status_code(report.is_healthy()),
        Json(StatusBody {
            status: report.status,
        }),
    )
}

// ── Manifest status ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ManifestStatus {
    pub healthy: bool,
}

/// GET /api/v1/manifest-status
pub async fn get_manifest_status(State(state): State<ApiState>) -> impl IntoResponse {
    ApiResponse::ok(ManifestStatus {
        healthy: state.manifest.read(),
    })
}

/// PUT /api/v1/manifest-status
pub async fn put_manifest_status(
    State(state): State<ApiState>,
    Json(status): Json<ManifestStatus>,
) -> impl IntoResponse {
    state.manifest.write(status.healthy);
    info!(healthy = status.healthy, "manifest status published");
    ApiResponse::ok(status)
}

// ── Plugin requests ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PluginRequestsBody {
    pub plugins: Vec<String>,
    #[serde(default)]
    pub correlation_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct DescriptorView {
    target_client_name: String,
    content_type: &'static str,
    correlation_id: String,
    payload_len: usize,
}

/// POST /api/v1/plugin-requests
pub async fn build_plugin_requests(
    State(state): State<ApiState>,
    Json(body): Json<PluginRequestsBody>,
) -> Response {
    match state
        .requests
        .build(&body.plugins, body.correlation_id.as_deref())
    {
        Ok(descriptors) => {
            let views: Vec<DescriptorView> = descriptors
                .into_iter()
                .map(|d| DescriptorView {
                    payload_len: d.payload.len(),
                    target_client_name: d.target_client_name,
                    content_type: d.content_type,
                    correlation_id: d.correlation_id,
                })
                .collect();
            ApiResponse::ok(views).into_response()
        }
        Err(e @ RequestError::DependencyConflict) => {
            error_response(&e.to_string(), StatusCode::CONFLICT).into_response()
        }
    }
}
