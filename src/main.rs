//! # Bhavstore: Daily Bhav Copy Ingest & Query Service
//!
//! ## Architecture Overview
//!
//! ```text
//!  ┌──────────────┐  ANY /update   ┌──────────────────────────────────────┐
//!  │  Cron / User │ ──────────────▶│ fetcher → decoder → metric → writer  │──┐
//!  └──────────────┘                └──────────────────────────────────────┘  │
//!                                        │ GET {base}/Equity/EQddmmyy_CSV.ZIP│
//!                                        ▼                                   ▼
//!                                  ┌───────────┐                    ┌──────────────┐
//!                                  │ Exchange  │                    │ Redis        │
//!                                  └───────────┘                    │ stock:{SYM}  │
//!  ┌──────────────┐  ANY /?q=..    ┌──────────────┐                 │ stock        │
//!  │  Front end   │ ──────────────▶│ query engine │◀────────────────│ last_updated │
//!  └──────────────┘                └──────────────┘                 └──────────────┘
//! ```
//!
//! ## Environment Variables
//!
//! | Variable                  | Default                                     | Description                     |
//! |---------------------------|---------------------------------------------|---------------------------------|
//! | `BIND_ADDR`               | `0.0.0.0:8080`                              | Address Axum listens on         |
//! | `REDIS_URL`               | `redis://127.0.0.1:6379`                    | Store; `memory` for in-process  |
//! | `BHAV_BASE_URL`           | `https://www.bseindia.com/download/BhavCopy`| Archive host                    |
//! | `BHAV_FALLBACK_NAME`      | `EQ230819`                                  | Archive used when today's fails |
//! | `FETCH_TIMEOUT_SECS`      | `30`                                        | Per-request download timeout    |
//! | `BHAV_UTC_OFFSET_MINUTES` | `330`                                       | Exchange clock for "today"      |
//! | `TOP_N`                   | `10`                                        | Size of the top movers listing  |
//! | `RUST_LOG`                | `bhavstore=debug`                           | Tracing filter                  |

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::Notify;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod engine;
mod error;
mod models;
mod routes;
mod state;
mod store;

use config::{Config, StoreBackend};
use state::build_state;
use store::{MemoryStore, RedisStore, SharedStore};

// ─── Entry Point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env (optional; real env vars win) ──────────────────────────
    dotenvy::dotenv().ok();

    // ── 2. Initialise structured logging ─────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("bhavstore=debug".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    info!(
        r#"

  ╔═══════════════════════════════════════════════╗
  ║        BHAVSTORE · End-of-Day Snapshot        ║
  ║        Rust + Axum  ·  Fetch & Query          ║
  ╚═══════════════════════════════════════════════╝"#
    );

    // ── 3. Config ────────────────────────────────────────────────────────────
    let config = Config::from_env().context("Failed to load config")?;
    info!(
        base_url = %config.base_url,
        fallback = %config.fallback_name,
        timeout  = ?config.fetch_timeout,
        top_n    = config.top_n,
        "Config loaded"
    );

    // ── 4. Store ─────────────────────────────────────────────────────────────
    let store: SharedStore = match &config.store {
        StoreBackend::Redis(url) => Arc::new(RedisStore::connect(url).await?),
        StoreBackend::Memory => {
            warn!("REDIS_URL=memory, records live in process memory only");
            Arc::new(MemoryStore::new())
        }
    };

    // ── 5. Shared state + router ─────────────────────────────────────────────
    let state = build_state(&config, store)?;
    let shutdown = state.shutdown.clone();
    let app = routes::router(state);

    // ── 6. Serve until Ctrl-C or /shutdown ───────────────────────────────────
    info!(addr = ?config.bind_addr, "🚀 Bhavstore server starting");
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal(requested: Arc<Notify>) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Ctrl-C handler failed; waiting for /shutdown only");
                requested.notified().await;
            }
        }
        _ = requested.notified() => {}
    }
}
