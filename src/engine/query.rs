//! # engine::query
//!
//! Read side: top movers or a symbol-prefix search over the current snapshot.
//!
//! Neither mode takes the ingest lock.  A query that races an `/update` may
//! see some rows from the new file and some from the old one.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::error::StoreError;
use crate::models::StockRecord;
use crate::store::StockStore;

/// What the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockQuery {
    /// Symbols starting with this (already uppercased) prefix.
    Search(String),
    /// The `n` largest changes, descending.
    Top(usize),
}

impl StockQuery {
    /// `q` absent or blank means top movers.
    pub fn from_param(q: Option<&str>, top_n: usize) -> Self {
        match q.map(str::trim) {
            Some(q) if !q.is_empty() => StockQuery::Search(q.to_uppercase()),
            _ => StockQuery::Top(top_n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Ok,
    /// Nothing has ever been ingested.
    NoData,
}

#[derive(Debug, Clone)]
pub struct QueryResult {
    pub status:       QueryStatus,
    pub stocks:       Vec<StockRecord>,
    pub last_updated: Option<DateTime<Utc>>,
}

pub async fn run_query(store: &dyn StockStore, query: &StockQuery) -> Result<QueryResult, StoreError> {
    let symbols = store.symbols().await?;
    let last_updated = store.last_updated().await?;

    if symbols.is_empty() {
        return Ok(QueryResult {
            status: QueryStatus::NoData,
            stocks: Vec::new(),
            last_updated,
        });
    }

    let stocks = match query {
        StockQuery::Search(prefix) => {
            let matching = symbols.into_iter().filter(|s| s.starts_with(prefix.as_str()));
            load_records(store, matching).await?
        }
        StockQuery::Top(n) => rank_top(load_records(store, symbols).await?, *n),
    };

    Ok(QueryResult {
        status: QueryStatus::Ok,
        stocks,
        last_updated,
    })
}

/// Highest change first; equal changes fall back to symbol order so the
/// listing is stable between requests.
pub fn rank_top(mut records: Vec<StockRecord>, n: usize) -> Vec<StockRecord> {
    records.sort_by(|a, b| {
        b.change
            .total_cmp(&a.change)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    records.truncate(n);
    records
}

/// Fetches records in the order given, dropping index entries with no record.
async fn load_records<I>(store: &dyn StockStore, symbols: I) -> Result<Vec<StockRecord>, StoreError>
where
    I: IntoIterator<Item = String>,
{
    let mut records = Vec::new();
    for symbol in symbols {
        match store.get_record(&symbol).await? {
            Some(record) => records.push(record),
            None => warn!(%symbol, "Index entry without a record, skipped"),
        }
    }
    Ok(records)
}
