use meter_store::{NewReceipt, Receipt};

use super::{
    check_header, column_index, field, optional_text, parse_date, parse_non_negative, CsvError,
    ParsedBatch, RejectReason, RowError,
};

/// Fixed receipt schema: `period_start,period_end,amount,notes`.
pub const RECEIPT_COLUMNS: &[&str] = &["period_start", "period_end", "amount", "notes"];

/// Parse a receipts CSV document. Same contract as readings parsing: header
/// checked as a set up front, rows validated and rejected individually.
/// A row additionally needs `period_end > period_start`.
pub fn parse_receipts(text: &str) -> Result<ParsedBatch<NewReceipt>, CsvError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = rdr.headers()?.clone();
    check_header(&headers, RECEIPT_COLUMNS)?;

    let start_idx = column_index(&headers, "period_start");
    let end_idx = column_index(&headers, "period_end");
    let amount_idx = column_index(&headers, "amount");
    let notes_idx = column_index(&headers, "notes");

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

        let reject = |reason: RejectReason, detail: String, errors: &mut Vec<RowError>| {
            metrics::counter!("csv_import_rows_rejected_total").increment(1);
            errors.push(RowError { row, reason, detail });
        };

        let start_raw = field(&record, start_idx);
        let period_start = match parse_date(start_raw) {
            Some(d) => d,
            None => {
                reject(
                    RejectReason::InvalidTimestamp,
                    format!("invalid period_start '{start_raw}'"),
                    &mut errors,
                );
                continue;
            }
        };

        let end_raw = field(&record, end_idx);
        let period_end = match parse_date(end_raw) {
            Some(d) => d,
            None => {
                reject(
                    RejectReason::InvalidTimestamp,
                    format!("invalid period_end '{end_raw}'"),
                    &mut errors,
                );
                continue;
            }
        };

        if period_end <= period_start {
            reject(
                RejectReason::InvalidPeriod,
                format!("period_end '{period_end}' not after period_start '{period_start}'"),
                &mut errors,
            );
            continue;
        }

        let amount_raw = field(&record, amount_idx);
        let amount = match parse_non_negative(amount_raw) {
            Some(v) => v,
            None => {
                reject(
                    RejectReason::InvalidAmount,
                    format!("invalid amount '{amount_raw}'"),
                    &mut errors,
                );
                continue;
            }
        };

        records.push(NewReceipt {
            period_start,
            period_end,
            amount,
            notes: optional_text(field(&record, notes_idx)),
        });
    }

    Ok(ParsedBatch { records, errors })
}

/// Serialize receipts in the fixed schema, periods as ISO dates.
pub fn receipts_to_csv(receipts: &[Receipt]) -> Result<String, CsvError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(RECEIPT_COLUMNS)?;

    for r in receipts {
        wtr.write_record(&[
            r.period_start.to_string(),
            r.period_end.to_string(),
            r.amount.to_string(),
            r.notes.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    let data = wtr
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    String::from_utf8(data)
        .map_err(|e| CsvError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn valid_rows_all_parse() {
        let doc = "period_start,period_end,amount,notes\n\
                   2024-01-01,2024-03-01,52.4,winter\n\
                   2024-03-01,2024-05-01,47.1,\n";
        let batch = parse_receipts(doc).unwrap();
        assert!(batch.errors.is_empty());
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[0].period_start, date!(2024 - 01 - 01));
        assert_eq!(batch.records[0].amount, 52.4);
        assert_eq!(batch.records[1].notes, None);
    }

    #[test]
    fn inverted_period_is_rejected() {
        let doc = "period_start,period_end,amount,notes\n\
                   2024-03-01,2024-01-01,52.4,\n";
        let batch = parse_receipts(doc).unwrap();
        assert!(batch.records.is_empty());
        assert_eq!(batch.errors.len(), 1);
        assert_eq!(batch.errors[0].reason, RejectReason::InvalidPeriod);
    }

    #[test]
    fn negative_amount_is_rejected() {
        let doc = "period_start,period_end,amount,notes\n\
                   2024-01-01,2024-03-01,-1,\n";
        let batch = parse_receipts(doc).unwrap();
        assert_eq!(batch.errors.len(), 1);
        assert_eq!(batch.errors[0].reason, RejectReason::InvalidAmount);
    }

    #[test]
    fn missing_amount_column_is_schema_mismatch() {
        let doc = "period_start,period_end,notes\n2024-01-01,2024-03-01,\n";
        assert!(matches!(
            parse_receipts(doc),
            Err(CsvError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn export_then_import_round_trips() {
        let rows = vec![Receipt {
            id: 1,
            period_start: date!(2024 - 01 - 01),
            period_end: date!(2024 - 03 - 01),
            amount: 52.4,
            notes: Some("winter".to_string()),
        }];

        let doc = receipts_to_csv(&rows).unwrap();
        let batch = parse_receipts(&doc).unwrap();
        assert!(batch.errors.is_empty());
        assert_eq!(batch.records[0].period_start, rows[0].period_start);
        assert_eq!(batch.records[0].period_end, rows[0].period_end);
        assert_eq!(batch.records[0].amount, rows[0].amount);
        assert_eq!(batch.records[0].notes, rows[0].notes);
    }
}
