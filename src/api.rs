use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::cycle::{run_cycle, CycleReport};
use crate::registry::AdapterRegistry;
use crate::source::SourceId;
use crate::store::{VersionRecord, VersionStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<VersionStore>,
    pub registry: Arc<AdapterRegistry>,
    pub adapter_timeout: Duration,
}

/// Build the API router. The static dashboard in `public_dir` is served at
/// the root; API routes take precedence over it.
pub fn create_router(state: AppState, public_dir: impl AsRef<std::path::Path>) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/versions", get(versions))
        .route("/refresh", post(refresh))
        .fallback_service(ServeDir::new(public_dir.as_ref()))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Full mapping from the most recently completed cycle. Best-effort by
/// design: a never-succeeded source is absent, a source whose latest cycle
/// failed shows its last-known-good record.
async fn versions(State(state): State<AppState>) -> Json<BTreeMap<SourceId, VersionRecord>> {
    Json(state.store.snapshot())
}

/// On-demand trigger: run one full cycle synchronously and report. Returns
/// only after results are persisted; 500 only when persistence itself fails.
async fn refresh(
    State(state): State<AppState>,
) -> Result<Json<CycleReport>, (StatusCode, String)> {
    let report = run_cycle(&state.registry, &state.store, state.adapter_timeout)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "on-demand cycle could not persist state");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
    tracing::info!(
        successes = report.successes,
        failures = report.failures.len(),
        changed = report.changed,
        "on-demand cycle complete"
    );
    Ok(Json(report))
}
