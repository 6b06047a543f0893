use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A single timestamped meter observation (absolute counter value, kWh).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reading {
    pub id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub kwh: f64,
    pub description: Option<String>,
}

/// A reading before insertion; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub created_at: OffsetDateTime,
    pub kwh: f64,
    pub description: Option<String>,
}
