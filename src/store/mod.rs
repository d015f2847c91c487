//! # store
//!
//! The key-value seam.  Ingest and query code only ever see
//! [`SharedStore`]; which backend sits behind it is decided once in `main`.
//!
//! Per-key operations are atomic.  Nothing here spans several records, so an
//! ingest that dies half way leaves a mix of old and new rows.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::StockRecord;

pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

#[async_trait]
pub trait StockStore: Send + Sync {
    /// Replace the record for `record.symbol` and add its key to the index.
    async fn put_record(&self, record: &StockRecord) -> Result<(), StoreError>;

    async fn get_record(&self, symbol: &str) -> Result<Option<StockRecord>, StoreError>;

    /// Every symbol in the index, in the backend's scan order.
    async fn symbols(&self) -> Result<Vec<String>, StoreError>;

    async fn set_last_updated(&self, at: DateTime<Utc>) -> Result<(), StoreError>;

    async fn last_updated(&self) -> Result<Option<DateTime<Utc>>, StoreError>;
}

pub type SharedStore = Arc<dyn StockStore>;

/// Parses the stored epoch-seconds scalar.  Fractional seconds are accepted
/// since older writers stored a float.
pub(crate) fn parse_epoch(raw: &str) -> Option<DateTime<Utc>> {
    let secs: f64 = raw.trim().parse().ok()?;
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_epoch() {
        let at = parse_epoch("1729056000").unwrap();
        assert_eq!(at.timestamp(), 1_729_056_000);

        let at = parse_epoch("1692445678.5").unwrap();
        assert_eq!(at.timestamp(), 1_692_445_678);
        assert_eq!(at.timestamp_subsec_millis(), 500);

        assert!(parse_epoch("yesterday").is_none());
        assert!(parse_epoch("NaN").is_none());
    }
}
