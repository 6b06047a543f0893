use sqlx::{postgres::PgPool, Postgres, QueryBuilder};

use crate::domain::{NewReading, NewReceipt, Reading, Receipt};
use crate::store::{Store, StoreError};

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the two record tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS readings (
                id          BIGSERIAL PRIMARY KEY,
                created_at  TIMESTAMPTZ NOT NULL,
                kwh         DOUBLE PRECISION NOT NULL CHECK (kwh >= 0),
                description TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS receipts (
                id           BIGSERIAL PRIMARY KEY,
                period_start DATE NOT NULL,
                period_end   DATE NOT NULL CHECK (period_end > period_start),
                amount       DOUBLE PRECISION NOT NULL CHECK (amount >= 0),
                notes        TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn create_reading(&self, new: NewReading) -> Result<Reading, StoreError> {
        let reading = sqlx::query_as::<_, Reading>(
            r#"
            INSERT INTO readings (created_at, kwh, description)
            VALUES ($1, $2, $3)
            RETURNING id, created_at, kwh, description
            "#,
        )
        .bind(new.created_at)
        .bind(new.kwh)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(reading)
    }

    async fn list_readings(&self) -> Result<Vec<Reading>, StoreError> {
        let rows = sqlx::query_as::<_, Reading>(
            r#"
            SELECT id, created_at, kwh, description
            FROM readings
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn get_reading(&self, id: i64) -> Result<Reading, StoreError> {
        sqlx::query_as::<_, Reading>(
            r#"
            SELECT id, created_at, kwh, description
            FROM readings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn delete_reading(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM readings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn create_readings_batch(&self, rows: Vec<NewReading>) -> Result<u64, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO readings (created_at, kwh, description) ",
        );
        builder.push_values(&rows, |mut b, r| {
            b.push_bind(r.created_at).push_bind(r.kwh).push_bind(&r.description);
        });

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn create_receipt(&self, new: NewReceipt) -> Result<Receipt, StoreError> {
        let receipt = sqlx::query_as::<_, Receipt>(
            r#"
            INSERT INTO receipts (period_start, period_end, amount, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING id, period_start, period_end, amount, notes
            "#,
        )
        .bind(new.period_start)
        .bind(new.period_end)
        .bind(new.amount)
        .bind(&new.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(receipt)
    }

    async fn list_receipts(&self) -> Result<Vec<Receipt>, StoreError> {
        let rows = sqlx::query_as::<_, Receipt>(
            r#"
            SELECT id, period_start, period_end, amount, notes
            FROM receipts
            ORDER BY period_start
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn get_receipt(&self, id: i64) -> Result<Receipt, StoreError> {
        sqlx::query_as::<_, Receipt>(
            r#"
            SELECT id, period_start, period_end, amount, notes
            FROM receipts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn delete_receipt(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM receipts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn create_receipts_batch(&self, rows: Vec<NewReceipt>) -> Result<u64, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO receipts (period_start, period_end, amount, notes) ",
        );
        builder.push_values(&rows, |mut b, r| {
            b.push_bind(r.period_start)
                .push_bind(r.period_end)
                .push_bind(r.amount)
                .push_bind(&r.notes);
        });

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
