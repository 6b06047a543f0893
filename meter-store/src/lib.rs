pub mod domain;
pub mod store;

pub use domain::{NewReading, NewReceipt, Reading, Receipt};
pub use store::{MemStore, PgStore, Store, StoreError};
