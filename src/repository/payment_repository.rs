use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::Payment,
    error::{is_unique_violation, sum_error, AppError, Result},
    repository::PaymentRepository,
};

#[derive(FromRow)]
struct PaymentRow {
    id: String,
    member_id: String,
    month: i64,
    year: i64,
    amount_cents: i64,
    payment_date: NaiveDate,
    dues_plan_snapshot: String,
    created_at: NaiveDateTime,
}

pub struct SqlitePaymentRepository {
    pool: SqlitePool,
}

impl SqlitePaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_payment(row: PaymentRow) -> Result<Payment> {
        Ok(Payment {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            member_id: row.member_id,
            month: row.month as u32,
            year: row.year as i32,
            amount_cents: row.amount_cents,
            payment_date: row.payment_date,
            dues_plan_snapshot: row.dues_plan_snapshot,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }
}

#[async_trait]
impl PaymentRepository for SqlitePaymentRepository {
    async fn create(&self, payment: &Payment) -> Result<Payment> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, member_id, month, year, amount_cents,
                payment_date, dues_plan_snapshot, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(payment.id.to_string())
        .bind(&payment.member_id)
        .bind(payment.month as i64)
        .bind(payment.year as i64)
        .bind(payment.amount_cents)
        .bind(payment.payment_date)
        .bind(&payment.dues_plan_snapshot)
        .bind(payment.created_at.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicatePayment {
                    member_id: payment.member_id.clone(),
                    month: payment.month,
                    year: payment.year,
                }
            } else {
                AppError::Database(e.to_string())
            }
        })?;

        self.find_for_period(&payment.member_id, payment.month, payment.year)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created payment".to_string()))
    }

    async fn find_for_period(&self, member_id: &str, month: u32, year: i32) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, member_id, month, year, amount_cents,
                   payment_date, dues_plan_snapshot, created_at
            FROM payments
            WHERE member_id = ? AND month = ? AND year = ?
            "#
        )
        .bind(member_id)
        .bind(month as i64)
        .bind(year as i64)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_payment).transpose()
    }

    async fn find_by_member(&self, member_id: &str) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, member_id, month, year, amount_cents,
                   payment_date, dues_plan_snapshot, created_at
            FROM payments
            WHERE member_id = ?
            ORDER BY year DESC, month DESC
            "#
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_payment)
            .collect()
    }

    async fn list_for_year(&self, year: i32) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, member_id, month, year, amount_cents,
                   payment_date, dues_plan_snapshot, created_at
            FROM payments
            WHERE year = ?
            ORDER BY member_id, month
            "#
        )
        .bind(year as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_payment)
            .collect()
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, member_id, month, year, amount_cents,
                   payment_date, dues_plan_snapshot, created_at
            FROM payments
            ORDER BY payment_date DESC, created_at DESC
            LIMIT ?
            "#
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_payment)
            .collect()
    }

    async fn total_for_year(&self, year: i32) -> Result<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM payments WHERE year = ?"
        )
        .bind(year as i64)
        .fetch_one(&self.pool)
        .await
        .map_err(sum_error)?;
        Ok(total)
    }
}
