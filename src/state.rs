//! # state
//!
//! The shared application state injected into every Axum handler.
//!
//! ## Design
//!
//! * `Arc<AppState>` is cloned cheaply into every handler via
//!   `axum::extract::State`.
//! * The store is a trait object, so handlers never know whether Redis or
//!   the in-memory backend is behind it.
//! * `ingest_lock` serialises `/update`: two ingests never interleave their
//!   writes, and the later one always stamps `last_updated` last.  Queries do
//!   not take it.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use anyhow::Context;
use chrono::FixedOffset;
use tokio::sync::{Mutex, Notify};

use crate::config::Config;
use crate::engine::fetcher::Fetcher;
use crate::store::SharedStore;

// ─── AppState ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,

    /// Shared HTTP client lives inside; one connection pool for all ingests.
    pub fetcher: Fetcher,

    pub exchange_tz: FixedOffset,

    /// Size of the top movers listing.
    pub top_n: usize,

    pub ingest_lock: Arc<Mutex<()>>,

    /// Fired by `/shutdown`; `main` waits on it for graceful shutdown.
    pub shutdown: Arc<Notify>,

    // ── Metrics ───────────────────────────────────────────────────────────────
    pub ingest_count: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(config: &Config, store: SharedStore) -> anyhow::Result<Self> {
        let fetcher = Fetcher::new(&config.base_url, &config.fallback_name, config.fetch_timeout)
            .context("Failed to build HTTP client")?;

        Ok(Self {
            store,
            fetcher,
            exchange_tz:  config.exchange_tz,
            top_n:        config.top_n,
            ingest_lock:  Arc::new(Mutex::new(())),
            shutdown:     Arc::new(Notify::new()),
            ingest_count: Arc::new(AtomicU64::new(0)),
        })
    }
}

/// Convenience type alias
pub type SharedState = Arc<AppState>;

pub fn build_state(config: &Config, store: SharedStore) -> anyhow::Result<SharedState> {
    Ok(Arc::new(AppState::new(config, store)?))
}
