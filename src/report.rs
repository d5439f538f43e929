//! Locating and decoding the snapshot rows of the TWSE 5-second report.
//!
//! The exchange publishes the intraday order book statistics as a report
//! meant for spreadsheets: a title line, the header, one row every five
//! seconds, then footnotes. Numeric cells are written as `="1,234"` so that
//! spreadsheet programs keep them as text. Only three lines matter here:
//! the header, the 09:00:00 row (market open) and the 13:30:00 row (market
//! close).
use csv::{ReaderBuilder, StringRecord};
use log::debug;

use crate::error::{ExtractError, Result};

/// Character the report uses to force text-mode cells.
pub const ESCAPE_CHAR: char = '=';
/// Quoted first cell of the header line.
pub const HEADER_MARKER: &str = "\"Time\"";
/// Quoted first cell of the market-open row.
pub const OPEN_MARKER: &str = "\"09:00:00\"";
/// Quoted first cell of the market-close row.
pub const CLOSE_MARKER: &str = "\"13:30:00\"";
/// Cells per row: time, seven counters and the empty cell after the trailing comma.
pub const FIELD_COUNT: usize = 9;

const KEPT_PREFIXES: [&str; 3] = [HEADER_MARKER, OPEN_MARKER, CLOSE_MARKER];

/// One decoded report row, cells still as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    fields: Vec<String>,
}

impl RawRow {
    /// Build a row from its cells. Callers outside the decoder are
    /// responsible for providing [`FIELD_COUNT`] cells.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// The `HH:MM:SS` cell.
    pub fn time(&self) -> &str {
        self.field(0)
    }

    /// Cell at `idx`, or `""` when absent.
    pub fn field(&self, idx: usize) -> &str {
        self.fields.get(idx).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<&StringRecord> for RawRow {
    fn from(record: &StringRecord) -> Self {
        Self::new(record.iter())
    }
}

/// Keep only the header, open and close lines of a raw report.
///
/// Every `=` is removed first; a line is kept when, trimmed, it starts with
/// one of the quoted markers. Kept lines are returned trimmed, in their
/// original order, each followed by `\n`. Total for any input.
pub fn filter_lines(raw: &str) -> String {
    let mut out = String::new();
    for line in raw.lines() {
        let unescaped = line.replace(ESCAPE_CHAR, "");
        let trimmed = unescaped.trim_start_matches('\u{feff}').trim();
        if KEPT_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
            out.push_str(trimmed);
            out.push('\n');
        }
    }
    debug!("kept {} report lines", out.lines().count());
    out
}

/// Decode filtered text into rows and drop the header.
///
/// Fails with [`ExtractError::MalformedInput`] when a record cannot be
/// decoded or does not carry [`FIELD_COUNT`] cells, and with
/// [`ExtractError::InsufficientData`] when fewer than three rows (header,
/// open, close) are present.
pub fn decode_rows(filtered: &str) -> Result<Vec<RawRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .from_reader(filtered.as_bytes());

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let fallback_line = idx as u64 + 1;
        let record = record.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or(fallback_line);
            ExtractError::malformed(line, e.to_string())
        })?;
        if record.len() != FIELD_COUNT {
            let line = record.position().map(|p| p.line()).unwrap_or(fallback_line);
            return Err(ExtractError::malformed(
                line,
                format!("expected {FIELD_COUNT} fields, found {}", record.len()),
            ));
        }
        rows.push(RawRow::from(&record));
    }

    debug!("decoded {} rows (header included)", rows.len());
    if rows.len() < 3 {
        return Err(ExtractError::InsufficientData { rows: rows.len() });
    }
    rows.remove(0);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = r#""Time","Acc. Bid Orders","Acc. Bid Volume","Acc. Ask Orders","Acc. Ask Volume","Acc. Transaction","Acc. Trade Volume","Acc. Trade Value (NT$M)","#;
    const OPEN: &str = r#"="09:00:00","197,267","3,646,951","177,784","1,069,239","0","0","0","#;
    const CLOSE: &str = r#"="13:30:00","5,069,709","11,612,878","6,275,984","7,339,558","1,024,038","4,523,597","112,550","#;

    fn report() -> String {
        [
            r#""108/02/15 Statistics of Best Bid/Ask and Transactions (5 seconds)""#,
            HEADER,
            OPEN,
            r#"="09:00:05","215,830","3,911,043","199,003","1,194,222","1,722","8,112","298","#,
            CLOSE,
            "",
            r#""Remarks:""#,
            r#""1. Order statistics at 13:30:00 include orders entered in the closing auction.""#,
        ]
        .join("\n")
    }

    #[test]
    fn filter_keeps_header_open_close_in_order() {
        let filtered = filter_lines(&report());
        let lines: Vec<&str> = filtered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with(HEADER_MARKER));
        assert!(lines[1].starts_with(OPEN_MARKER));
        assert!(lines[2].starts_with(CLOSE_MARKER));
        assert!(!filtered.contains('='));
        assert!(filtered.ends_with('\n'));
    }

    #[test]
    fn filter_is_total() {
        assert_eq!(filter_lines(""), "");
        assert_eq!(filter_lines("\n\n  \n"), "");
        assert_eq!(filter_lines("no markers here\n\"Remarks:\""), "");
    }

    #[test]
    fn filter_trims_and_handles_crlf() {
        let raw = format!("  {HEADER}\r\n\t{OPEN}\r\n{CLOSE}  \r\n");
        let filtered = filter_lines(&raw);
        assert!(!filtered.contains('\r'));
        assert_eq!(filtered.lines().count(), 3);
        assert!(filtered.lines().all(|l| l == l.trim()));
    }

    #[test]
    fn filter_ignores_marker_outside_first_cell() {
        let raw = format!("{HEADER}\n\"Remarks\",\"09:00:00\"\n{OPEN}\n{CLOSE}\n");
        assert_eq!(filter_lines(&raw).lines().count(), 3);
    }

    #[test]
    fn decode_drops_header() {
        let rows = decode_rows(&filter_lines(&report())).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].time(), "09:00:00");
        assert_eq!(rows[0].field(1), "197,267");
        assert_eq!(rows[0].field(8), "");
        assert_eq!(rows[1].time(), "13:30:00");
        assert_eq!(rows[1].field(7), "112,550");
        assert!(rows.iter().all(|r| r.len() == FIELD_COUNT));
    }

    #[test]
    fn decode_header_only_is_insufficient() {
        let filtered = filter_lines(HEADER);
        assert_eq!(
            decode_rows(&filtered),
            Err(ExtractError::InsufficientData { rows: 1 })
        );
    }

    #[test]
    fn decode_empty_is_insufficient() {
        assert_eq!(
            decode_rows(""),
            Err(ExtractError::InsufficientData { rows: 0 })
        );
    }

    #[test]
    fn decode_rejects_unequal_rows() {
        let filtered = format!("{HEADER}\n\"09:00:00\",\"1\",\"2\"\n{}\n", &CLOSE[1..]);
        let err = decode_rows(&filtered).unwrap_err();
        match err {
            ExtractError::MalformedInput { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_wrong_field_count() {
        let filtered = "\"Time\",\"a\"\n\"09:00:00\",\"1\"\n\"13:30:00\",\"2\"\n";
        let err = decode_rows(filtered).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedInput { line: 1, .. }));
    }
}
