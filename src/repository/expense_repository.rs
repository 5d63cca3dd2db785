use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Expense, ExpenseCategory, RecordExpenseRequest},
    error::{sum_error, AppError, Result},
    repository::ExpenseRepository,
};

#[derive(FromRow)]
struct ExpenseRow {
    id: String,
    concept: String,
    amount_cents: i64,
    spent_on: NaiveDate,
    category: String,
    description: Option<String>,
    created_at: NaiveDateTime,
}

pub struct SqliteExpenseRepository {
    pool: SqlitePool,
}

impl SqliteExpenseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_expense(row: ExpenseRow) -> Result<Expense> {
        Ok(Expense {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            concept: row.concept,
            amount_cents: row.amount_cents,
            spent_on: row.spent_on,
            category: ExpenseCategory::from_str(&row.category)
                .ok_or_else(|| AppError::Database(format!("Invalid expense category: {}", row.category)))?,
            description: row.description,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }
}

#[async_trait]
impl ExpenseRepository for SqliteExpenseRepository {
    async fn create(&self, request: &RecordExpenseRequest) -> Result<Expense> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO expenses (id, concept, amount_cents, spent_on, category, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&request.concept)
        .bind(request.amount_cents)
        .bind(request.spent_on)
        .bind(request.category.as_str())
        .bind(&request.description)
        .bind(now.naive_utc())
        .execute(&self.pool)
        .await?;

        Ok(Expense {
            id,
            concept: request.concept.clone(),
            amount_cents: request.amount_cents,
            spent_on: request.spent_on,
            category: request.category,
            description: request.description.clone(),
            created_at: now,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Expense>> {
        let row = sqlx::query_as::<_, ExpenseRow>(
            r#"
            SELECT id, concept, amount_cents, spent_on, category, description, created_at
            FROM expenses
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_expense).transpose()
    }

    async fn list(&self) -> Result<Vec<Expense>> {
        let rows = sqlx::query_as::<_, ExpenseRow>(
            r#"
            SELECT id, concept, amount_cents, spent_on, category, description, created_at
            FROM expenses
            ORDER BY spent_on DESC, created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_expense).collect()
    }

    async fn list_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Expense>> {
        let rows = sqlx::query_as::<_, ExpenseRow>(
            r#"
            SELECT id, concept, amount_cents, spent_on, category, description, created_at
            FROM expenses
            WHERE spent_on BETWEEN ? AND ?
            ORDER BY spent_on, created_at
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_expense).collect()
    }

    async fn update(&self, id: Uuid, request: &RecordExpenseRequest) -> Result<Expense> {
        let result = sqlx::query(
            r#"
            UPDATE expenses
            SET concept = ?, amount_cents = ?, spent_on = ?, category = ?, description = ?
            WHERE id = ?
            "#,
        )
        .bind(&request.concept)
        .bind(request.amount_cents)
        .bind(request.spent_on)
        .bind(request.category.as_str())
        .bind(&request.description)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Expense not found".to_string()));
        }
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Expense not found".to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Expense not found".to_string()));
        }
        Ok(())
    }

    async fn total(&self) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(amount_cents), 0) FROM expenses")
            .fetch_one(&self.pool)
            .await
            .map_err(sum_error)?;
        Ok(total)
    }
}
