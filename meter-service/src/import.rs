use meter_store::{Store, StoreError};

use crate::csv_codec::{self, CsvError, ImportSummary};

#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    Csv(#[from] CsvError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Parse a readings CSV document and insert the valid rows as one batch.
///
/// A schema mismatch aborts before anything is written. Row validation
/// failures only exclude their own row; the import itself is best-effort and
/// does not roll back on partial failure. A persistence failure of the batch
/// insert propagates as an error.
pub async fn import_readings(
    store: &dyn Store,
    csv_text: &str,
) -> Result<ImportSummary, ImportError> {
    let batch = csv_codec::parse_readings(csv_text)?;
    let inserted = store.create_readings_batch(batch.records).await? as usize;
    metrics::counter!("csv_import_rows_inserted_total").increment(inserted as u64);

    tracing::info!(inserted, rejected = batch.errors.len(), "readings import finished");
    Ok(ImportSummary {
        inserted,
        rejected: batch.errors.len(),
        errors: batch.errors,
    })
}

/// Receipt counterpart of [`import_readings`], same contract.
pub async fn import_receipts(
    store: &dyn Store,
    csv_text: &str,
) -> Result<ImportSummary, ImportError> {
    let batch = csv_codec::parse_receipts(csv_text)?;
    let inserted = store.create_receipts_batch(batch.records).await? as usize;
    metrics::counter!("csv_import_rows_inserted_total").increment(inserted as u64);

    tracing::info!(inserted, rejected = batch.errors.len(), "receipts import finished");
    Ok(ImportSummary {
        inserted,
        rejected: batch.errors.len(),
        errors: batch.errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_codec::RejectReason;
    use meter_store::MemStore;

    #[tokio::test]
    async fn counts_add_up_to_total_rows() {
        let store = MemStore::new();
        let doc = "created_at,kwh,description\n\
                   2024-01-01T00:00:00Z,100,\n\
                   not-a-date,50,\n\
                   2024-03-01T00:00:00Z,-5,\n\
                   2024-04-01T00:00:00Z,200,\n";

        let summary = import_readings(&store, doc).await.unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.rejected, 2);
        assert_eq!(summary.inserted + summary.rejected, 4);
        assert_eq!(summary.errors[0].reason, RejectReason::InvalidTimestamp);
        assert_eq!(summary.errors[1].reason, RejectReason::InvalidAmount);

        let stored = store.list_readings().await.unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[tokio::test]
    async fn schema_mismatch_inserts_nothing() {
        let store = MemStore::new();
        let doc = "created_at,description\n2024-01-01T00:00:00Z,x\n";

        let err = import_readings(&store, doc).await.unwrap_err();
        assert!(matches!(err, ImportError::Csv(CsvError::SchemaMismatch { .. })));
        assert!(store.list_readings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_rows_are_never_persisted() {
        let store = MemStore::new();
        let doc = "created_at,kwh,description\n\
                   2024-01-01T00:00:00Z,100,keep\n\
                   2024-02-01T00:00:00Z,oops,drop\n";

        let summary = import_readings(&store, doc).await.unwrap();
        assert_eq!(summary.inserted, 1);

        let stored = store.list_readings().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].description.as_deref(), Some("keep"));
    }

    #[tokio::test]
    async fn receipts_import_rejects_inverted_period() {
        let store = MemStore::new();
        let doc = "period_start,period_end,amount,notes\n\
                   2024-01-01,2024-03-01,52.4,\n\
                   2024-05-01,2024-03-01,10,\n";

        let summary = import_receipts(&store, doc).await.unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.errors[0].reason, RejectReason::InvalidPeriod);
        assert_eq!(store.list_receipts().await.unwrap().len(), 1);
    }
}
