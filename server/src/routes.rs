//! The query surface: dashboard page, live data and a health report.

use std::time::Instant;

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use log::debug;
use serde::Serialize;

use cropsense_common::SnapshotStore;
use cropsense_model::DashboardRecord;

const DASHBOARD_PAGE: &str = include_str!("../ui/index.html");

/// Shared between all handlers. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    store: SnapshotStore,
    sensor_connected: bool,
    started_at: Instant,
}

impl AppState {
    pub fn new(store: SnapshotStore, sensor_connected: bool) -> Self {
        Self {
            store,
            sensor_connected,
            started_at: Instant::now(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/data", get(live_data))
        .route("/health", get(health))
        .with_state(state)
}

/// GET / - the dashboard page
async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD_PAGE)
}

/// GET /data - the latest record, or the placeholder before the first prediction
async fn live_data(State(state): State<AppState>) -> Json<DashboardRecord> {
    let record = state.store.record();
    debug!("Serving {record:?}");
    Json(record)
}

#[derive(Serialize, Debug)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub sensor_connected: bool,
    pub updates: u64,
    pub last_update: Option<String>,
    pub uptime_seconds: u64,
}

/// GET /health - whether data is actually flowing
async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let snapshot = state.store.get();

    Json(HealthReport {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        sensor_connected: state.sensor_connected,
        updates: snapshot.sequence,
        last_update: snapshot.updated_at.map(|at| at.to_rfc3339()),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}
