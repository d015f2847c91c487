//! # models::stock
//!
//! Defines [`StockRecord`], the per-symbol snapshot written by every ingest and
//! read back by every query, together with the key-value layout it lives in.
//!
//! ```text
//!  stock:{SYMBOL}  →  hash { name, code, open, high, low, close, prev_close, change }
//!  stock           →  set  { stock:{SYMBOL}, ... }
//!  last_updated    →  "1729056000"
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Prefix of every record key.
pub const KEY_PREFIX: &str = "stock:";

/// Set holding every record key ever written.
pub const INDEX_KEY: &str = "stock";

pub const LAST_UPDATED_KEY: &str = "last_updated";

/// `stock:{symbol}`
#[inline]
pub fn record_key(symbol: &str) -> String {
    format!("{KEY_PREFIX}{symbol}")
}

// ─── StockRecord ──────────────────────────────────────────────────────────────

/// One symbol's end-of-day snapshot.
///
/// Prices stay as the exchange formatted them; only `change` is computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    /// Trimmed exchange symbol, e.g. `"TATASTEEL"`.  Primary key.
    pub symbol: String,
    /// Exchange-assigned scrip code, e.g. `"500470"`.
    pub code: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub prev_close: String,
    /// Percentage change against the previous close.  Always finite.
    pub change: f64,
}

impl StockRecord {
    pub fn key(&self) -> String {
        record_key(&self.symbol)
    }

    /// Hash fields in the stored layout.
    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name",       self.symbol.clone()),
            ("code",       self.code.clone()),
            ("open",       self.open.clone()),
            ("high",       self.high.clone()),
            ("low",        self.low.clone()),
            ("close",      self.close.clone()),
            ("prev_close", self.prev_close.clone()),
            ("change",     self.change.to_string()),
        ]
    }

    /// Rebuilds a record from a stored hash.  `key` is only used for error
    /// messages.
    pub fn from_fields(key: &str, mut fields: HashMap<String, String>) -> Result<Self, StoreError> {
        let mut take = |name: &str| {
            fields.remove(name).ok_or_else(|| StoreError::Corrupt {
                key: key.to_string(),
                reason: format!("missing field {name}"),
            })
        };

        let symbol     = take("name")?;
        let code       = take("code")?;
        let open       = take("open")?;
        let high       = take("high")?;
        let low        = take("low")?;
        let close      = take("close")?;
        let prev_close = take("prev_close")?;
        let raw_change = take("change")?;

        let change = raw_change.trim().parse::<f64>().map_err(|_| StoreError::Corrupt {
            key: key.to_string(),
            reason: format!("change is not a number: {raw_change:?}"),
        })?;

        Ok(Self { symbol, code, open, high, low, close, prev_close, change })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StockRecord {
        StockRecord {
            symbol:     "TATASTEEL".into(),
            code:       "500470".into(),
            open:       "118.55".into(),
            high:       "120.10".into(),
            low:        "117.90".into(),
            close:      "119.85".into(),
            prev_close: "118.20".into(),
            change:     1.3959390862944199,
        }
    }

    #[test]
    fn test_key_layout() {
        assert_eq!(sample().key(), "stock:TATASTEEL");
        assert_eq!(record_key("TCS"), "stock:TCS");
    }

    #[test]
    fn test_fields_survive_storage_format() {
        let record = sample();
        let fields: HashMap<String, String> = record
            .to_fields()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        assert_eq!(fields["name"], "TATASTEEL");
        assert_eq!(fields["prev_close"], "118.20");

        let back = StockRecord::from_fields("stock:TATASTEEL", fields).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_missing_field_is_corrupt() {
        let mut fields: HashMap<String, String> = sample()
            .to_fields()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        fields.remove("code");

        let err = StockRecord::from_fields("stock:TATASTEEL", fields).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref reason, .. } if reason.contains("code")));
    }

    #[test]
    fn test_legacy_float_change_parses() {
        let mut fields: HashMap<String, String> = sample()
            .to_fields()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        fields.insert("change".into(), "-2.5".into());

        let back = StockRecord::from_fields("stock:TATASTEEL", fields).unwrap();
        assert_eq!(back.change, -2.5);
    }
}
