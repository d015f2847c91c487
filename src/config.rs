//! # config
//!
//! Settings read from the environment.  `main` loads `.env` first, so a
//! real variable always wins over the file.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context};
use chrono::FixedOffset;

pub const DEFAULT_BASE_URL: &str = "https://www.bseindia.com/download/BhavCopy";

/// Last archive known to be published; used when today's is not up yet.
pub const DEFAULT_FALLBACK_NAME: &str = "EQ230819";

/// India Standard Time, UTC+05:30.
const DEFAULT_UTC_OFFSET_MINUTES: i32 = 330;

pub const DEFAULT_TOP_N: usize = 10;

/// Where records live.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    Redis(String),
    /// Process-local maps; nothing survives a restart.
    Memory,
}

/// Config ทั้งหมดที่ service ต้องการ
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr:      SocketAddr,
    pub store:          StoreBackend,
    /// Prefix before `/Equity/{name}_CSV.ZIP`
    pub base_url:       String,
    pub fallback_name:  String,
    pub fetch_timeout:  Duration,
    /// Offset used to decide which trading day "today" is
    pub exchange_tz:    FixedOffset,
    pub top_n:          usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr: SocketAddr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .context("BIND_ADDR must be host:port")?;

        let redis_url = lookup("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string());
        let store = if redis_url.eq_ignore_ascii_case("memory") {
            StoreBackend::Memory
        } else {
            StoreBackend::Redis(redis_url)
        };

        let timeout_secs: u64 = lookup("FETCH_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .context("FETCH_TIMEOUT_SECS must be a number")?;
        if timeout_secs == 0 {
            bail!("FETCH_TIMEOUT_SECS must be greater than zero");
        }

        let offset_minutes: i32 = match lookup("BHAV_UTC_OFFSET_MINUTES") {
            Some(raw) => raw.parse().context("BHAV_UTC_OFFSET_MINUTES must be a number")?,
            None => DEFAULT_UTC_OFFSET_MINUTES,
        };
        let exchange_tz = FixedOffset::east_opt(offset_minutes * 60)
            .with_context(|| format!("BHAV_UTC_OFFSET_MINUTES out of range: {offset_minutes}"))?;

        let top_n: usize = match lookup("TOP_N") {
            Some(raw) => raw.parse().context("TOP_N must be a number")?,
            None => DEFAULT_TOP_N,
        };

        Ok(Self {
            bind_addr,
            store,
            base_url:      lookup("BHAV_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            fallback_name: lookup("BHAV_FALLBACK_NAME").unwrap_or_else(|| DEFAULT_FALLBACK_NAME.to_string()),
            fetch_timeout: Duration::from_secs(timeout_secs),
            exchange_tz,
            top_n,
        })
    }
}
