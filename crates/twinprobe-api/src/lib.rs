//! twinprobe-api: HTTP surface for the twinprobe daemon.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/healthz` | Aggregate report (200 healthy, 503 unhealthy) |
//! | GET | `/healthz/{probe}` | Evaluate one probe now |
//! | GET | `/api/v1/manifest-status` | Current manifest flag |
//! | PUT | `/api/v1/manifest-status` | Publish the manifest flag |
//! | POST | `/api/v1/plugin-requests` | Build request descriptors (409 when the manifest is unhealthy) |
//!
//! The plugin-side router only serves `/healthz` and `/health/health`.

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use twinprobe_health::{HealthMonitor, SharedHealthFlag};
use twinprobe_request::PluginRequestBuilder;

/// Shared state for engine handlers.
#[derive(Clone)]
pub struct ApiState {
    pub monitor: Arc<HealthMonitor>,
    pub manifest: SharedHealthFlag,
    pub requests: PluginRequestBuilder,
}

impl ApiState {
    pub fn new(monitor: Arc<HealthMonitor>, manifest: SharedHealthFlag) -> Self {
        Self {
            monitor,
            requests: PluginRequestBuilder::new(manifest.clone()),
            manifest,
        }
    }
}

/// Engine router: health reports, manifest status and request building.
pub fn build_router(state: ApiState) -> Router {
    let api_routes = Router::new()
        .route(
            "/manifest-status",
            get(handlers::get_manifest_status).put(handlers::put_manifest_status),
        )
        .route("/plugin-requests", post(handlers::build_plugin_requests))
        .with_state(state.clone());

    Router::new()
        .merge(health_routes(state.monitor))
        .nest("/api/v1", api_routes)
}

/// Plugin-side router: health only.
pub fn plugin_router(monitor: Arc<HealthMonitor>) -> Router {
    Router::new()
        .route("/health/health", get(handlers::plugin_health))
        .with_state(monitor.clone())
        .merge(health_routes(monitor))
}

fn health_routes(monitor: Arc<HealthMonitor>) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health_report))
        .route("/healthz/{probe}", get(handlers::probe_report))
        .with_state(monitor)
}
