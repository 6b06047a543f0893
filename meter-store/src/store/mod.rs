mod memory;
mod postgres;

pub use memory::MemStore;
pub use postgres::PgStore;

use crate::domain::{NewReading, NewReceipt, Reading, Receipt};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("persistence error: {0}")]
    Persistence(#[from] sqlx::Error),
}

/// Persistence interface over the two record tables.
///
/// Listing is always ordered: readings by `created_at` ascending, receipts by
/// `period_start` ascending. The batch operations insert all rows in a single
/// statement; a batch either lands whole or not at all.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    async fn create_reading(&self, new: NewReading) -> Result<Reading, StoreError>;
    async fn list_readings(&self) -> Result<Vec<Reading>, StoreError>;
    async fn get_reading(&self, id: i64) -> Result<Reading, StoreError>;
    async fn delete_reading(&self, id: i64) -> Result<(), StoreError>;
    async fn create_readings_batch(&self, rows: Vec<NewReading>) -> Result<u64, StoreError>;

    async fn create_receipt(&self, new: NewReceipt) -> Result<Receipt, StoreError>;
    async fn list_receipts(&self) -> Result<Vec<Receipt>, StoreError>;
    async fn get_receipt(&self, id: i64) -> Result<Receipt, StoreError>;
    async fn delete_receipt(&self, id: i64) -> Result<(), StoreError>;
    async fn create_receipts_batch(&self, rows: Vec<NewReceipt>) -> Result<u64, StoreError>;
}
