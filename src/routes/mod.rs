//! HTTP surface.
//!
//! | Method | Path             | Description                                 |
//! |--------|------------------|---------------------------------------------|
//! | ANY    | `/update`        | Fetch today's bhav copy and refresh records |
//! | ANY    | `/`, `/index`    | Top movers, or prefix search with `?q=`     |
//! | ANY    | `/shutdown`      | Graceful process exit                       |
//! | GET    | `/health`        | Store connectivity                          |

pub mod stocks;
pub mod system;
pub mod update;

use axum::{
    routing::{any, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::SharedState;

pub fn router(state: SharedState) -> Router {
    // Front end may be served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Ingest ───────────────────────────────────────────────────────────
        .route("/update",   any(update::update))
        // ── Query ────────────────────────────────────────────────────────────
        .route("/",         any(stocks::index))
        .route("/index",    any(stocks::index))
        // ── System ───────────────────────────────────────────────────────────
        .route("/health",   get(system::health_check))
        .route("/shutdown", any(system::shutdown))
        // ── Middleware ───────────────────────────────────────────────────────
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
