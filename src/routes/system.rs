//! # routes::system
//!
//! Process plumbing: health and shutdown.

use std::sync::atomic::Ordering;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::info;

use crate::{error::AppError, state::SharedState};

/// GET /health: store connectivity plus a few counters.
pub async fn health_check(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let symbols = state.store.symbols().await?.len();
    let last_updated = state.store.last_updated().await?;

    Ok(Json(json!({
        "ok":           true,
        "symbols":      symbols,
        "last_updated": last_updated,
        "ingest_count": state.ingest_count.load(Ordering::Relaxed),
    })))
}

/// ANY /shutdown: stop accepting connections and exit once in-flight
/// requests finish.
pub async fn shutdown(State(state): State<SharedState>) -> impl IntoResponse {
    info!("🛑 Shutdown requested");
    state.shutdown.notify_one();
    StatusCode::NO_CONTENT
}
