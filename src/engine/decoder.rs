//! # engine::decoder
//!
//! Opens a downloaded bhav copy archive and yields its CSV rows.
//!
//! The exchange ships one member per archive, `{resource}.CSV`, with a
//! header row followed by one row per scrip:
//!
//! ```text
//! SC_CODE,SC_NAME,SC_GROUP,SC_TYPE,OPEN,HIGH,LOW,CLOSE,LAST,PREVCLOSE,NO_TRADES,...
//! 500470,TATASTEEL   ,A ,Q,118.55,120.10,117.90,119.85,119.80,118.20,21034,...
//! ```
//!
//! Columns are read by position.  The header is skipped, never interpreted.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::error::DecodeError;

// ─── Column Contract ──────────────────────────────────────────────────────────

/// Positions of the fields we consume.
#[derive(Debug, Clone, Copy)]
pub struct Columns {
    pub code:       usize,
    pub symbol:     usize,
    pub open:       usize,
    pub high:       usize,
    pub low:        usize,
    pub close:      usize,
    /// Last traded price; the change percentage is measured from this.
    pub last:       usize,
    pub prev_close: usize,
}

pub const COLUMNS: Columns = Columns {
    code:       0,
    symbol:     1,
    open:       4,
    high:       5,
    low:        6,
    close:      7,
    last:       8,
    prev_close: 9,
};

/// Rows narrower than this cannot satisfy [`COLUMNS`].
pub const MIN_ROW_WIDTH: usize = 10;

// ─── BhavRow ──────────────────────────────────────────────────────────────────

/// One data row, still as text.
#[derive(Debug, Clone, PartialEq)]
pub struct BhavRow {
    /// 1-based line in the member, for log messages.
    pub line:       u64,
    pub code:       String,
    /// Raw exchange name, padding included.
    pub symbol:     String,
    pub open:       String,
    pub high:       String,
    pub low:        String,
    pub close:      String,
    pub last:       String,
    pub prev_close: String,
}

impl BhavRow {
    fn from_record(record: &csv::StringRecord) -> Result<Self, DecodeError> {
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() < MIN_ROW_WIDTH {
            return Err(DecodeError::ShortRow {
                line,
                fields: record.len(),
                expected: MIN_ROW_WIDTH,
            });
        }

        let at = |idx: usize| record[idx].to_string();

        Ok(Self {
            line,
            code:       at(COLUMNS.code),
            symbol:     at(COLUMNS.symbol),
            open:       at(COLUMNS.open),
            high:       at(COLUMNS.high),
            low:        at(COLUMNS.low),
            close:      at(COLUMNS.close),
            last:       at(COLUMNS.last),
            prev_close: at(COLUMNS.prev_close),
        })
    }
}

// ─── Decoding ─────────────────────────────────────────────────────────────────

/// `EQ161026` → `EQ161026.CSV`
pub fn member_name(resource: &str) -> String {
    format!("{resource}.CSV")
}

/// Lazily decoded rows of one archive member.
///
/// Whole-archive failures are reported by [`decode`]; each item here is a
/// single row, so callers can skip bad rows and keep going.
pub struct DecodedRows {
    records: csv::StringRecordsIntoIter<Cursor<Vec<u8>>>,
}

impl Iterator for DecodedRows {
    type Item = Result<BhavRow, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = match self.records.next()? {
            Ok(record) => BhavRow::from_record(&record),
            Err(e) => Err(e.into()),
        };
        Some(item)
    }
}

/// Opens `bytes` as a ZIP archive and returns the rows of `{resource}.CSV`.
///
/// `resource` must be the name that was actually downloaded; after a
/// fallback that is the fallback name, not today's.  The member lookup
/// ignores ASCII case and any directory prefix.
pub fn decode(bytes: &[u8], resource: &str) -> Result<DecodedRows, DecodeError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let wanted = member_name(resource);

    let actual = archive
        .file_names()
        .find(|name| {
            let base = name.rsplit('/').next().unwrap_or(*name);
            base.eq_ignore_ascii_case(&wanted)
        })
        .map(str::to_string)
        .ok_or_else(|| DecodeError::MissingMember(wanted.clone()))?;

    let mut member = archive.by_name(&actual)?;
    let mut contents = Vec::with_capacity(member.size() as usize);
    member.read_to_end(&mut contents)?;

    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(Cursor::new(contents));

    Ok(DecodedRows {
        records: reader.into_records(),
    })
}

// ─── Test Fixtures ────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    pub const HEADER: &str =
        "SC_CODE,SC_NAME,SC_GROUP,SC_TYPE,OPEN,HIGH,LOW,CLOSE,LAST,PREVCLOSE,NO_TRADES,NO_OF_SHRS,NET_TURNOV,TDCLOADIND";

    /// A data row in exchange layout with the given symbol and prices.
    pub fn row(code: &str, symbol: &str, last: &str, prev_close: &str) -> String {
        format!("{code},{symbol:<12},A ,Q,10.00,11.00,9.50,{last},{last},{prev_close},120,3400,35700.00,")
    }

    /// Builds an in-memory archive holding one member.
    pub fn archive(member: &str, body: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(member, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(body.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    /// Header plus the given rows, newline-terminated.
    pub fn csv(rows: &[String]) -> String {
        let mut out = String::from(HEADER);
        out.push('\n');
        for row in rows {
            out.push_str(row);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{archive, csv, row};
    use super::*;

    #[test]
    fn test_nine_rows_after_header() {
        let rows: Vec<String> = (0..9)
            .map(|i| row(&format!("50000{i}"), &format!("SYM{i}"), "10.50", "10.00"))
            .collect();
        let bytes = archive("EQ161026.CSV", &csv(&rows));

        let decoded: Vec<_> = decode(&bytes, "EQ161026").unwrap().collect();
        assert_eq!(decoded.len(), 9);
        assert!(decoded.iter().all(Result::is_ok));
    }

    #[test]
    fn test_fixed_columns() {
        let bytes = archive(
            "EQ161026.CSV",
            &csv(&[row("500470", "TATASTEEL", "119.80", "118.20")]),
        );

        let first = decode(&bytes, "EQ161026").unwrap().next().unwrap().unwrap();
        assert_eq!(first.code, "500470");
        assert_eq!(first.symbol.trim(), "TATASTEEL");
        assert_eq!(first.open, "10.00");
        assert_eq!(first.high, "11.00");
        assert_eq!(first.low, "9.50");
        assert_eq!(first.close, "119.80");
        assert_eq!(first.last, "119.80");
        assert_eq!(first.prev_close, "118.20");
        assert_eq!(first.line, 2);
    }

    #[test]
    fn test_short_row_is_a_row_error() {
        let body = csv(&[
            row("500001", "GOOD", "10.50", "10.00"),
            "500002,SHORT,A,Q,1,2,3,4".to_string(),
            row("500003", "ALSOGOOD", "10.50", "10.00"),
        ]);
        let bytes = archive("EQ161026.CSV", &body);

        let decoded: Vec<_> = decode(&bytes, "EQ161026").unwrap().collect();
        assert_eq!(decoded.len(), 3);
        assert!(decoded[0].is_ok());
        assert!(matches!(
            decoded[1],
            Err(DecodeError::ShortRow { fields: 8, expected: 10, line: 3 })
        ));
        assert!(decoded[2].is_ok());
    }

    #[test]
    fn test_member_must_match_resource() {
        let bytes = archive("EQ230819.CSV", &csv(&[]));

        match decode(&bytes, "EQ161026") {
            Err(DecodeError::MissingMember(name)) => assert_eq!(name, "EQ161026.CSV"),
            other => panic!("expected MissingMember, got {:?}", other.map(|_| ())),
        }
        assert!(decode(&bytes, "EQ230819").is_ok());
    }

    #[test]
    fn test_member_lookup_ignores_case() {
        let bytes = archive("eq161026.csv", &csv(&[row("500001", "A", "1", "1")]));
        assert_eq!(decode(&bytes, "EQ161026").unwrap().count(), 1);
    }

    #[test]
    fn test_garbage_is_archive_error() {
        let result = decode(b"<html>not found</html>", "EQ161026");
        assert!(matches!(result, Err(DecodeError::Archive(_))));
    }

    #[test]
    fn test_header_only() {
        let bytes = archive("EQ161026.CSV", &csv(&[]));
        assert_eq!(decode(&bytes, "EQ161026").unwrap().count(), 0);
    }
}
