//! # engine::ingest
//!
//! Fetch → decode → compute → write, the whole `/update` pass.
//!
//! Rows are written one at a time as the decoder yields them.  A row that
//! fails to decode or parse is logged and skipped; a store failure aborts the
//! pass.  `last_updated` is only stamped after the final row, so an aborted
//! pass leaves the previous timestamp in place next to whatever rows it
//! already wrote.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::engine::decoder::{decode, BhavRow};
use crate::engine::fetcher::Fetcher;
use crate::engine::metric::{compute_change, parse_price};
use crate::error::{AppError, DecodeError, ParseError, StoreError};
use crate::models::StockRecord;
use crate::store::StockStore;

// ─── Row → Record ─────────────────────────────────────────────────────────────

/// Turns a decoded row into the record stored under its trimmed symbol.
///
/// Only `last` and `prev_close` must be numeric; the other price columns are
/// kept verbatim for display.
pub fn record_from_row(row: &BhavRow) -> Result<StockRecord, ParseError> {
    let symbol = row.symbol.trim();
    if symbol.is_empty() {
        return Err(ParseError {
            field: "symbol",
            value: row.symbol.clone(),
        });
    }

    let last = parse_price("last", &row.last)?;
    let prev_close = parse_price("prev_close", &row.prev_close)?;

    Ok(StockRecord {
        symbol:     symbol.to_string(),
        code:       row.code.trim().to_string(),
        open:       row.open.trim().to_string(),
        high:       row.high.trim().to_string(),
        low:        row.low.trim().to_string(),
        close:      row.close.trim().to_string(),
        prev_close: row.prev_close.trim().to_string(),
        change:     compute_change(last, prev_close),
    })
}

// ─── Store Writer ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    pub written:     usize,
    pub skipped:     usize,
    pub finished_at: DateTime<Utc>,
}

/// Upserts every good row, then stamps `last_updated` with the time `clock`
/// reports once the rows are exhausted.
pub async fn write_rows<I>(
    store: &dyn StockStore,
    rows: I,
    clock: impl FnOnce() -> DateTime<Utc>,
) -> Result<WriteSummary, StoreError>
where
    I: IntoIterator<Item = Result<BhavRow, DecodeError>>,
{
    let (mut written, mut skipped) = (0, 0);

    for row in rows {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "Skipping undecodable row");
                skipped += 1;
                continue;
            }
        };

        let record = match record_from_row(&row) {
            Ok(record) => record,
            Err(e) => {
                warn!(line = row.line, error = %e, "Skipping row with bad number");
                skipped += 1;
                continue;
            }
        };

        store.put_record(&record).await?;
        debug!(symbol = %record.symbol, change = record.change, "Record written");
        written += 1;
    }

    let finished_at = clock();
    store.set_last_updated(finished_at).await?;

    Ok(WriteSummary { written, skipped, finished_at })
}

// ─── Full Pass ────────────────────────────────────────────────────────────────

/// What one `/update` pass did.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub resource:      String,
    pub used_fallback: bool,
    pub written:       usize,
    pub skipped:       usize,
    pub finished_at:   DateTime<Utc>,
}

pub async fn run_ingest(
    fetcher: &Fetcher,
    store: &dyn StockStore,
    today: NaiveDate,
) -> Result<IngestReport, AppError> {
    let archive = fetcher.fetch(today).await?;
    let rows = decode(&archive.bytes, &archive.resource)?;

    let summary = write_rows(store, rows, Utc::now).await?;

    let report = IngestReport {
        resource:      archive.resource.clone(),
        used_fallback: archive.used_fallback,
        written:       summary.written,
        skipped:       summary.skipped,
        finished_at:   summary.finished_at,
    };

    info!(
        url           = %archive.url,
        resource      = %report.resource,
        used_fallback = report.used_fallback,
        written       = report.written,
        skipped       = report.skipped,
        "✅ Ingest complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::decoder::fixtures::{archive, csv, row};
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use httpmock::prelude::*;
    use std::time::Duration;

    fn bhav_row(symbol: &str, last: &str, prev_close: &str) -> BhavRow {
        BhavRow {
            line:       2,
            code:       "500470".into(),
            symbol:     format!("{symbol}   "),
            open:       "118.55".into(),
            high:       "120.10".into(),
            low:        "117.90".into(),
            close:      "119.85".into(),
            last:       last.into(),
            prev_close: prev_close.into(),
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_record_from_row() {
        let record = record_from_row(&bhav_row("TATASTEEL", "120.00", "100.00")).unwrap();
        assert_eq!(record.symbol, "TATASTEEL");
        assert_eq!(record.code, "500470");
        assert_eq!(record.close, "119.85");
        assert_eq!(record.prev_close, "100.00");
        assert!((record.change - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_record_from_row_zero_prev_close() {
        let record = record_from_row(&bhav_row("NEWLIST", "55.00", "0.00")).unwrap();
        assert_eq!(record.change, 0.0);
    }

    #[test]
    fn test_record_from_row_rejects_bad_number() {
        let err = record_from_row(&bhav_row("TCS", "n/a", "100")).unwrap_err();
        assert_eq!(err.field, "last");

        let err = record_from_row(&bhav_row("   ", "1", "1")).unwrap_err();
        assert_eq!(err.field, "symbol");
    }

    #[tokio::test]
    async fn test_bad_rows_are_skipped_not_fatal() {
        let store = MemoryStore::new();
        let rows = vec![
            Ok(bhav_row("GOOD", "110", "100")),
            Ok(bhav_row("BADNUM", "-", "100")),
            Err(DecodeError::ShortRow { line: 4, fields: 8, expected: 10 }),
            Ok(bhav_row("ALSOGOOD", "90", "100")),
        ];

        let summary = write_rows(&store, rows, || at(1_000)).await.unwrap();

        assert_eq!(
            summary,
            WriteSummary { written: 2, skipped: 2, finished_at: at(1_000) }
        );
        assert_eq!(store.symbols().await.unwrap(), vec!["ALSOGOOD", "GOOD"]);
        assert!(store.get_record("BADNUM").await.unwrap().is_none());
        assert_eq!(store.last_updated().await.unwrap(), Some(at(1_000)));
    }

    #[tokio::test]
    async fn test_rewrite_is_idempotent_except_timestamp() {
        let store = MemoryStore::new();
        let input = || vec![Ok(bhav_row("TCS", "110", "100")), Ok(bhav_row("INFY", "95", "100"))];

        write_rows(&store, input(), || at(1_000)).await.unwrap();
        let symbols_once = store.symbols().await.unwrap();
        let tcs_once = store.get_record("TCS").await.unwrap();

        write_rows(&store, input(), || at(2_000)).await.unwrap();

        assert_eq!(store.symbols().await.unwrap(), symbols_once);
        assert_eq!(store.get_record("TCS").await.unwrap(), tcs_once);
        assert_eq!(store.last_updated().await.unwrap(), Some(at(2_000)));
    }

    #[tokio::test]
    async fn test_stale_symbols_are_kept() {
        let store = MemoryStore::new();
        write_rows(&store, vec![Ok(bhav_row("DELISTED", "1", "1"))], || at(1))
            .await
            .unwrap();
        write_rows(&store, vec![Ok(bhav_row("TCS", "1", "1"))], || at(2))
            .await
            .unwrap();

        assert_eq!(store.symbols().await.unwrap(), vec!["DELISTED", "TCS"]);
    }

    #[tokio::test]
    async fn test_run_ingest_after_fallback_reads_fallback_member() {
        let server = MockServer::start_async().await;
        let body = archive(
            "EQ230819.CSV",
            &csv(&[
                row("500470", "TATASTEEL", "120.00", "100.00"),
                row("532540", "TCS", "3000.00", "3000.00"),
            ]),
        );
        server
            .mock_async(|when, then| {
                when.method(GET).path("/Equity/EQ161026_CSV.ZIP");
                then.status(404);
            })
            .await;
        server
            .mock_async(move |when, then| {
                when.method(GET).path("/Equity/EQ230819_CSV.ZIP");
                then.status(200).body(body);
            })
            .await;

        let fetcher = Fetcher::new(server.base_url(), "EQ230819", Duration::from_secs(5)).unwrap();
        let store = MemoryStore::new();
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();

        let report = run_ingest(&fetcher, &store, today).await.unwrap();

        assert_eq!(report.resource, "EQ230819");
        assert!(report.used_fallback);
        assert_eq!(report.written, 2);
        assert_eq!(report.skipped, 0);

        let steel = store.get_record("TATASTEEL").await.unwrap().unwrap();
        assert!((steel.change - 20.0).abs() < 1e-9);
        assert_eq!(store.last_updated().await.unwrap(), Some(report.finished_at));
    }

    #[tokio::test]
    async fn test_run_ingest_fetch_failure_writes_nothing() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(500);
            })
            .await;

        let fetcher = Fetcher::new(server.base_url(), "EQ230819", Duration::from_secs(5)).unwrap();
        let store = MemoryStore::new();
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();

        let err = run_ingest(&fetcher, &store, today).await.unwrap_err();
        assert!(matches!(err, AppError::Fetch(_)));
        assert!(store.last_updated().await.unwrap().is_none());
    }
}
