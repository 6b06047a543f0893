use meter_store::{NewReading, Reading};
use time::format_description::well_known::Rfc3339;

use super::{
    check_header, column_index, field, optional_text, parse_non_negative, parse_timestamp, CsvError,
    ParsedBatch, RejectReason, RowError,
};

/// Fixed reading schema: `created_at,kwh,description`.
pub const READING_COLUMNS: &[&str] = &["created_at", "kwh", "description"];

/// Parse a readings CSV document.
///
/// The header must match [`READING_COLUMNS`] as a set; a mismatch aborts the
/// whole document. Each data row is validated independently: `created_at` must
/// be ISO-8601, `kwh` a finite non-negative number. Rejected rows are reported
/// with their 1-based data row index and excluded from the result.
pub fn parse_readings(text: &str) -> Result<ParsedBatch<NewReading>, CsvError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = rdr.headers()?.clone();
    check_header(&headers, READING_COLUMNS)?;

    let created_at_idx = column_index(&headers, "created_at");
    let kwh_idx = column_index(&headers, "kwh");
    let description_idx = column_index(&headers, "description");

    let mut records = Vec::new();
    let mut errors = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let row = i + 1;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                metrics::counter!("csv_import_rows_rejected_total").increment(1);
                errors.push(RowError {
                    row,
                    reason: RejectReason::MalformedRow,
                    detail: e.to_string(),
                });
                continue;
            }
        };

        let ts_raw = field(&record, created_at_idx);
        let created_at = match parse_timestamp(ts_raw) {
            Some(ts) => ts,
            None => {
                metrics::counter!("csv_import_rows_rejected_total").increment(1);
                errors.push(RowError {
                    row,
                    reason: RejectReason::InvalidTimestamp,
                    detail: format!("invalid created_at '{ts_raw}'"),
                });
                continue;
            }
        };

        let kwh_raw = field(&record, kwh_idx);
        let kwh = match parse_non_negative(kwh_raw) {
            Some(v) => v,
            None => {
                metrics::counter!("csv_import_rows_rejected_total").increment(1);
                errors.push(RowError {
                    row,
                    reason: RejectReason::InvalidAmount,
                    detail: format!("invalid kwh '{kwh_raw}'"),
                });
                continue;
            }
        };

        records.push(NewReading {
            created_at,
            kwh,
            description: optional_text(field(&record, description_idx)),
        });
    }

    Ok(ParsedBatch { records, errors })
}

/// Serialize readings in the same fixed schema, `created_at` as RFC 3339.
/// Output is deterministic for a given input sequence.
pub fn readings_to_csv(readings: &[Reading]) -> Result<String, CsvError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(READING_COLUMNS)?;

    for r in readings {
        wtr.write_record(&[
            r.created_at.format(&Rfc3339)?,
            r.kwh.to_string(),
            r.description.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    let data = wtr
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    String::from_utf8(data)
        .map_err(|e| CsvError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}
