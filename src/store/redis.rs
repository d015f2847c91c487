//! # store::redis
//!
//! Redis-backed [`StockStore`] over an auto-reconnecting
//! [`ConnectionManager`].  The manager is cheap to clone, so every call takes
//! its own handle instead of sharing one behind a lock.

use std::collections::HashMap;

use ::redis::aio::ConnectionManager;
use ::redis::AsyncCommands;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use super::{parse_epoch, StockStore};
use crate::error::StoreError;
use crate::models::{record_key, StockRecord, INDEX_KEY, KEY_PREFIX, LAST_UPDATED_KEY};

#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Opens the connection eagerly so a bad `REDIS_URL` fails at startup.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        info!(url, "Connecting to Redis...");

        let client = ::redis::Client::open(url).context("Invalid REDIS_URL")?;
        let conn = client
            .get_connection_manager()
            .await
            .context("Failed to connect to Redis")?;

        info!("✅ Redis connected");
        Ok(Self { conn })
    }
}

#[async_trait]
impl StockStore for RedisStore {
    async fn put_record(&self, record: &StockRecord) -> Result<(), StoreError> {
        let key = record.key();
        let fields = record.to_fields();
        let mut conn = self.conn.clone();

        // Hash and index entry land together or not at all.
        let () = ::redis::pipe()
            .atomic()
            .hset_multiple(&key, fields.as_slice())
            .ignore()
            .sadd(INDEX_KEY, &key)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(())
    }

    async fn get_record(&self, symbol: &str) -> Result<Option<StockRecord>, StoreError> {
        let key = record_key(symbol);
        let mut conn = self.conn.clone();

        let fields: HashMap<String, String> = conn.hgetall(&key).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        StockRecord::from_fields(&key, fields).map(Some)
    }

    async fn symbols(&self) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn.smembers(INDEX_KEY).await?;

        Ok(keys
            .into_iter()
            .filter_map(|key| key.strip_prefix(KEY_PREFIX).map(str::to_string))
            .collect())
    }

    async fn set_last_updated(&self, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let () = conn.set(LAST_UPDATED_KEY, at.timestamp()).await?;
        Ok(())
    }

    async fn last_updated(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(LAST_UPDATED_KEY).await?;

        match raw {
            None => Ok(None),
            Some(raw) => parse_epoch(&raw).map(Some).ok_or_else(|| StoreError::Corrupt {
                key: LAST_UPDATED_KEY.to_string(),
                reason: format!("not an epoch timestamp: {raw:?}"),
            }),
        }
    }
}
