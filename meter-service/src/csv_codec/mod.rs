mod readings;
mod receipts;

pub use readings::{parse_readings, readings_to_csv, READING_COLUMNS};
pub use receipts::{parse_receipts, receipts_to_csv, RECEIPT_COLUMNS};

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// Why a single data row was rejected during import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    InvalidTimestamp,
    InvalidAmount,
    InvalidPeriod,
    MalformedRow,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InvalidTimestamp => "invalid_timestamp",
            Self::InvalidAmount => "invalid_amount",
            Self::InvalidPeriod => "invalid_period",
            Self::MalformedRow => "malformed_row",
        };
        f.write_str(s)
    }
}

/// A rejected row: 1-based data row index (header excluded), reason code and a
/// human-readable detail.
#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    pub row: usize,
    pub reason: RejectReason,
    pub detail: String,
}

#[derive(thiserror::Error, Debug)]
pub enum CsvError {
    #[error("csv schema mismatch: missing columns {missing:?}, unknown columns {unknown:?}")]
    SchemaMismatch {
        missing: Vec<String>,
        unknown: Vec<String>,
    },
    #[error("csv read error: {0}")]
    Csv(#[from] csv::Error),
    #[error("timestamp format error: {0}")]
    Format(#[from] time::error::Format),
    #[error("csv write error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of parsing one CSV document: the rows that validated and the rows
/// that did not. A bad row never aborts the rest of the document.
#[derive(Debug, Clone)]
pub struct ParsedBatch<T> {
    pub records: Vec<T>,
    pub errors: Vec<RowError>,
}

impl<T> ParsedBatch<T> {
    pub fn total_rows(&self) -> usize {
        self.records.len() + self.errors.len()
    }
}

/// Result of importing one CSV document into the store.
/// `inserted + rejected` always equals the number of data rows.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub inserted: usize,
    pub rejected: usize,
    pub errors: Vec<RowError>,
}

/// Validate the header against the expected column set, order-insensitive.
/// Missing, unknown, or duplicated columns fail the whole document before
/// any row is read.
fn check_header(headers: &csv::StringRecord, expected: &[&str]) -> Result<(), CsvError> {
    let names: Vec<&str> = headers.iter().map(str::trim).collect();

    let missing: Vec<String> = expected
        .iter()
        .filter(|col| !names.contains(col))
        .map(|col| col.to_string())
        .collect();

    // Exact set match: a repeated column is as much a mismatch as a foreign one.
    let mut seen: Vec<&str> = Vec::new();
    let mut unknown: Vec<String> = Vec::new();
    for name in names.iter().copied() {
        if !expected.contains(&name) || seen.contains(&name) {
            unknown.push(name.to_string());
        } else {
            seen.push(name);
        }
    }

    if missing.is_empty() && unknown.is_empty() {
        Ok(())
    } else {
        Err(CsvError::SchemaMismatch { missing, unknown })
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> usize {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .unwrap_or(usize::MAX)
}

fn field<'r>(record: &'r csv::StringRecord, idx: usize) -> &'r str {
    record.get(idx).unwrap_or("")
}

/// Parse an ISO-8601 timestamp. Accepts RFC 3339, a naive
/// `YYYY-MM-DDTHH:MM:SS[.ffffff]` form (taken as UTC) and a bare date
/// (midnight UTC), matching what previous exports produced.
fn parse_timestamp(s: &str) -> Option<OffsetDateTime> {
    let s = s.trim();
    if let Ok(ts) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(ts);
    }

    let naive = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    if let Ok(dt) = PrimitiveDateTime::parse(s, naive) {
        return Some(dt.assume_utc());
    }

    let naive_subsec =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
    if let Ok(dt) = PrimitiveDateTime::parse(s, naive_subsec) {
        return Some(dt.assume_utc());
    }

    parse_date(s).map(|d| d.midnight().assume_utc())
}

/// Parse a bare ISO date, falling back to the timestamp forms above.
fn parse_date(s: &str) -> Option<Date> {
    let s = s.trim();
    let iso_date = format_description!("[year]-[month]-[day]");
    if let Ok(d) = Date::parse(s, iso_date) {
        return Some(d);
    }
    OffsetDateTime::parse(s, &Rfc3339).ok().map(|ts| ts.date())
}

/// A finite, non-negative decimal; anything else is invalid.
fn parse_non_negative(s: &str) -> Option<f64> {
    let v: f64 = s.trim().parse().ok()?;
    (v.is_finite() && v >= 0.0).then_some(v)
}

fn optional_text(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
