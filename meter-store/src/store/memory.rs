use tokio::sync::Mutex;

use crate::domain::{NewReading, NewReceipt, Reading, Receipt};
use crate::store::{Store, StoreError};

#[derive(Default)]
struct Inner {
    readings: Vec<Reading>,
    receipts: Vec<Receipt>,
    next_id: i64,
}

impl Inner {
    fn alloc_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory store with the same ordering and error semantics as `PgStore`.
/// Backs service tests so they do not need a running database.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Store for MemStore {
    async fn create_reading(&self, new: NewReading) -> Result<Reading, StoreError> {
        let mut inner = self.inner.lock().await;
        let reading = Reading {
            id: inner.alloc_id(),
            created_at: new.created_at,
            kwh: new.kwh,
            description: new.description,
        };
        inner.readings.push(reading.clone());
        Ok(reading)
    }

    async fn list_readings(&self) -> Result<Vec<Reading>, StoreError> {
        let inner = self.inner.lock().await;
        let mut rows = inner.readings.clone();
        rows.sort_by_key(|r| r.created_at);
        Ok(rows)
    }

    async fn get_reading(&self, id: i64) -> Result<Reading, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .readings
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn delete_reading(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let before = inner.readings.len();
        inner.readings.retain(|r| r.id != id);
        if inner.readings.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn create_readings_batch(&self, rows: Vec<NewReading>) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let count = rows.len() as u64;
        for new in rows {
            let id = inner.alloc_id();
            inner.readings.push(Reading {
                id,
                created_at: new.created_at,
                kwh: new.kwh,
                description: new.description,
            });
        }
        Ok(count)
    }

    async fn create_receipt(&self, new: NewReceipt) -> Result<Receipt, StoreError> {
        let mut inner = self.inner.lock().await;
        let receipt = Receipt {
            id: inner.alloc_id(),
            period_start: new.period_start,
            period_end: new.period_end,
            amount: new.amount,
            notes: new.notes,
        };
        inner.receipts.push(receipt.clone());
        Ok(receipt)
    }

    async fn list_receipts(&self) -> Result<Vec<Receipt>, StoreError> {
        let inner = self.inner.lock().await;
        let mut rows = inner.receipts.clone();
        rows.sort_by_key(|r| r.period_start);
        Ok(rows)
    }

    async fn get_receipt(&self, id: i64) -> Result<Receipt, StoreError> {
        let inner = self.inner.lock().await;
        inner
            .receipts
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn delete_receipt(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let before = inner.receipts.len();
        inner.receipts.retain(|r| r.id != id);
        if inner.receipts.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn create_receipts_batch(&self, rows: Vec<NewReceipt>) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let count = rows.len() as u64;
        for new in rows {
            let id = inner.alloc_id();
            inner.receipts.push(Receipt {
                id,
                period_start: new.period_start,
                period_end: new.period_end,
                amount: new.amount,
                notes: new.notes,
            });
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn reading_at(ts: time::OffsetDateTime, kwh: f64) -> NewReading {
        NewReading {
            created_at: ts,
            kwh,
            description: None,
        }
    }

    #[tokio::test]
    async fn readings_are_listed_in_time_order() {
        let store = MemStore::new();
        store
            .create_reading(reading_at(datetime!(2024-02-01 00:00:00 UTC), 150.0))
            .await
            .unwrap();
        store
            .create_reading(reading_at(datetime!(2024-01-01 00:00:00 UTC), 100.0))
            .await
            .unwrap();

        let rows = store.list_readings().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].kwh, 100.0);
        assert_eq!(rows[1].kwh, 150.0);
    }

    #[tokio::test]
    async fn get_and_delete_missing_reading_is_not_found() {
        let store = MemStore::new();
        assert!(matches!(store.get_reading(42).await, Err(StoreError::NotFound)));
        assert!(matches!(store.delete_reading(42).await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn delete_removes_the_reading() {
        let store = MemStore::new();
        let created = store
            .create_reading(reading_at(datetime!(2024-01-01 00:00:00 UTC), 10.0))
            .await
            .unwrap();

        store.delete_reading(created.id).await.unwrap();
        assert!(matches!(store.get_reading(created.id).await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn receipts_are_listed_by_period_start() {
        let store = MemStore::new();
        store
            .create_receipt(NewReceipt {
                period_start: date!(2024 - 03 - 01),
                period_end: date!(2024 - 05 - 01),
                amount: 60.0,
                notes: None,
            })
            .await
            .unwrap();
        store
            .create_receipt(NewReceipt {
                period_start: date!(2024 - 01 - 01),
                period_end: date!(2024 - 03 - 01),
                amount: 50.0,
                notes: None,
            })
            .await
            .unwrap();

        let rows = store.list_receipts().await.unwrap();
        assert_eq!(rows[0].amount, 50.0);
        assert_eq!(rows[1].amount, 60.0);
    }

    #[tokio::test]
    async fn batch_insert_reports_row_count() {
        let store = MemStore::new();
        let inserted = store
            .create_readings_batch(vec![
                reading_at(datetime!(2024-01-01 00:00:00 UTC), 1.0),
                reading_at(datetime!(2024-01-02 00:00:00 UTC), 2.0),
            ])
            .await
            .unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(store.list_readings().await.unwrap().len(), 2);
    }
}
