//! Domain models shared across the ingest and query paths.

pub mod stock;

pub use stock::{record_key, StockRecord, INDEX_KEY, KEY_PREFIX, LAST_UPDATED_KEY};
