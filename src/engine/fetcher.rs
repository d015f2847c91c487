//! # engine::fetcher
//!
//! Downloads the day's bhav copy archive.
//!
//! ```text
//!   GET {base}/Equity/EQ{ddmmyy}_CSV.ZIP      ── 2xx ──▶ Archive
//!        │ non-2xx / transport error
//!        ▼
//!   GET {base}/Equity/{fallback}_CSV.ZIP      ── 2xx ──▶ Archive (used_fallback)
//!        │ non-2xx / transport error
//!        ▼
//!   FetchError
//! ```
//!
//! One fallback, no further retries.  Every request carries the configured
//! timeout.

use std::time::Duration;

use chrono::{FixedOffset, NaiveDate, Utc};
use tracing::{info, warn};

use crate::error::FetchError;

/// The exchange's download host refuses requests without a browser agent.
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// `EQ` followed by the trading date as `ddmmyy`.
pub fn resource_name(date: NaiveDate) -> String {
    format!("EQ{}", date.format("%d%m%y"))
}

pub fn archive_url(base_url: &str, resource: &str) -> String {
    format!("{base_url}/Equity/{resource}_CSV.ZIP")
}

/// Today's calendar date on the exchange's clock.
pub fn exchange_today(tz: FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// A downloaded, still-compressed archive.
#[derive(Debug, Clone)]
pub struct Archive {
    /// Name of the resource that was actually served, e.g. `EQ161026`.
    pub resource: String,
    pub url: String,
    pub bytes: Vec<u8>,
    pub used_fallback: bool,
}

#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    base_url: String,
    fallback_name: String,
}

impl Fetcher {
    pub fn new(
        base_url: impl Into<String>,
        fallback_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            fallback_name: fallback_name.into(),
        })
    }

    /// Fetch the archive for `today`, falling back once to the fixed
    /// snapshot.
    pub async fn fetch(&self, today: NaiveDate) -> Result<Archive, FetchError> {
        let primary = resource_name(today);

        let primary_reason = match self.download(&primary).await {
            Ok(archive) => return Ok(archive),
            Err(reason) => reason,
        };

        warn!(
            resource = %primary,
            reason   = %primary_reason,
            fallback = %self.fallback_name,
            "Today's bhav copy unavailable, falling back"
        );

        match self.download(&self.fallback_name).await {
            Ok(archive) => Ok(Archive {
                used_fallback: true,
                ..archive
            }),
            Err(fallback_reason) => Err(FetchError {
                primary,
                primary_reason,
                fallback: self.fallback_name.clone(),
                fallback_reason,
            }),
        }
    }

    async fn download(&self, resource: &str) -> Result<Archive, String> {
        let url = archive_url(&self.base_url, resource);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }

        let bytes = response.bytes().await.map_err(|e| e.to_string())?;
        info!(%url, size = bytes.len(), "📥 Bhav copy downloaded");

        Ok(Archive {
            resource: resource.to_string(),
            url,
            bytes: bytes.to_vec(),
            used_fallback: false,
        })
    }
}
