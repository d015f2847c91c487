//! # routes::update
//!
//! `/update` runs one full ingest pass synchronously and redirects to the
//! listing once it is done.

use std::sync::atomic::Ordering;

use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
};
use tracing::info;

use crate::{
    engine::{fetcher::exchange_today, ingest::run_ingest},
    error::AppError,
    state::SharedState,
};

// ─── ANY /update ──────────────────────────────────────────────────────────────

/// ### Response
/// * `303 See Other` → `/` after a complete pass
/// * `502` when neither archive could be fetched or the archive is unreadable
/// * `503` when the store rejects a write
pub async fn update(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    // Queue behind any ingest already running.
    let _guard = state.ingest_lock.lock().await;

    let today = exchange_today(state.exchange_tz);
    info!(%today, "🔄 [UPDATE] Ingest starting");

    let report = run_ingest(&state.fetcher, state.store.as_ref(), today).await?;
    state.ingest_count.fetch_add(1, Ordering::Relaxed);

    info!(
        resource = %report.resource,
        written  = report.written,
        "🔄 [UPDATE] Snapshot refreshed"
    );

    Ok(Redirect::to("/"))
}
