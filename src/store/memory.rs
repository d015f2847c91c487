//! # store::memory
//!
//! Process-local [`StockStore`].  Mirrors the Redis layout (hash per record,
//! index of record keys, one timestamp scalar) so the two backends behave the
//! same under the query engine.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::StockStore;
use crate::error::StoreError;
use crate::models::{record_key, StockRecord, KEY_PREFIX};

#[derive(Default)]
struct Inner {
    records: HashMap<String, StockRecord>,
    /// Record keys; ordered so scan order is deterministic.
    index: BTreeSet<String>,
    last_updated: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StockStore for MemoryStore {
    async fn put_record(&self, record: &StockRecord) -> Result<(), StoreError> {
        let key = record.key();
        let mut inner = self.inner.write().await;
        inner.records.insert(key.clone(), record.clone());
        inner.index.insert(key);
        Ok(())
    }

    async fn get_record(&self, symbol: &str) -> Result<Option<StockRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(&record_key(symbol)).cloned())
    }

    async fn symbols(&self) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .index
            .iter()
            .filter_map(|key| key.strip_prefix(KEY_PREFIX))
            .map(str::to_string)
            .collect())
    }

    async fn set_last_updated(&self, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.inner.write().await.last_updated = Some(at);
        Ok(())
    }

    async fn last_updated(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.inner.read().await.last_updated)
    }
}
