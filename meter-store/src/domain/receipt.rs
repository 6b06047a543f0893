use serde::{Deserialize, Serialize};
use time::Date;

/// A billing record covering one period with a total amount.
///
/// Invariant: `period_end > period_start`. The Postgres schema enforces it with a
/// CHECK constraint; callers are expected to validate before insertion.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Receipt {
    pub id: i64,
    pub period_start: Date,
    pub period_end: Date,
    pub amount: f64,
    pub notes: Option<String>,
}

/// A receipt before insertion; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReceipt {
    pub period_start: Date,
    pub period_end: Date,
    pub amount: f64,
    pub notes: Option<String>,
}
