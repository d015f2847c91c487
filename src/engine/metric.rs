//! # engine::metric
//!
//! The change-percentage calculation and the tolerant number parsing that
//! feeds it.

use crate::error::ParseError;

/// `(reference - prev_close) * 100 / prev_close`, or exactly `0.0` when the
/// previous close is zero.  Some listings carry a zero previous close
/// (first trading day, suspended scrips).
#[inline]
pub fn compute_change(reference: f64, prev_close: f64) -> f64 {
    if prev_close == 0.0 {
        return 0.0;
    }
    (reference - prev_close) * 100.0 / prev_close
}

/// Parses a price column.  Surrounding whitespace is ignored; anything that
/// is not a finite number is an error.
pub fn parse_price(field: &'static str, raw: &str) -> Result<f64, ParseError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError {
            field,
            value: raw.to_string(),
        })
}
