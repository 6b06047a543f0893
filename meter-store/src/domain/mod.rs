pub mod reading;
pub mod receipt;

pub use reading::{NewReading, Reading};
pub use receipt::{NewReceipt, Receipt};
