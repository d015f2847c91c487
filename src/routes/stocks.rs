//! # routes::stocks
//!
//! The listing the front end renders.
//!
//! | Request        | Result                                     |
//! |----------------|--------------------------------------------|
//! | `/`, `/index`  | top movers by change, descending           |
//! | `/?q=ta`       | every symbol starting with `TA`            |

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::{
    engine::query::{run_query, QueryStatus, StockQuery},
    error::AppError,
    state::SharedState,
};

const NO_DATA_MESSAGE: &str = "No data yet. Please sync via /update.";

#[derive(Debug, Default, Deserialize)]
pub struct IndexParams {
    pub q: Option<String>,
}

/// `2026-10-16 18:30:05` on the exchange clock.
fn display_time(at: DateTime<Utc>, tz: FixedOffset) -> String {
    at.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S").to_string()
}

// ─── ANY / and /index ─────────────────────────────────────────────────────────

pub async fn index(
    State(state): State<SharedState>,
    Query(params): Query<IndexParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = StockQuery::from_param(params.q.as_deref(), state.top_n);
    let result = run_query(state.store.as_ref(), &query).await?;

    let message = match result.status {
        QueryStatus::NoData => Some(NO_DATA_MESSAGE),
        QueryStatus::Ok => None,
    };

    Ok(Json(json!({
        "ok":                   true,
        "status":               result.status,
        "q":                    params.q.unwrap_or_default(),
        "last_updated":         result.last_updated,
        "last_updated_display": result.last_updated.map(|at| display_time(at, state.exchange_tz)),
        "message":              message,
        "stocks":               result.stocks,
    })))
}
