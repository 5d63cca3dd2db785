use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{CreateDuesPlanRequest, DuesPlan, UpdateDuesPlanRequest},
    error::{is_unique_violation, AppError, Result},
    repository::DuesPlanRepository,
};

#[derive(FromRow)]
struct DuesPlanRow {
    id: String,
    name: String,
    fee_cents: i64,
    sort_order: i32,
    is_active: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteDuesPlanRepository {
    pool: SqlitePool,
}

impl SqliteDuesPlanRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_plan(row: DuesPlanRow) -> Result<DuesPlan> {
        Ok(DuesPlan {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            name: row.name,
            fee_cents: row.fee_cents,
            sort_order: row.sort_order,
            is_active: row.is_active != 0,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    async fn next_sort_order(&self) -> Result<i32> {
        let row: (Option<i32>,) = sqlx::query_as("SELECT MAX(sort_order) FROM dues_plans")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.0.unwrap_or(0) + 1)
    }
}

#[async_trait]
impl DuesPlanRepository for SqliteDuesPlanRepository {
    async fn create(&self, request: CreateDuesPlanRequest) -> Result<DuesPlan> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();
        let sort_order = self.next_sort_order().await?;

        sqlx::query(
            r#"
            INSERT INTO dues_plans (
                id, name, fee_cents, sort_order, is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&request.name)
        .bind(request.fee_cents)
        .bind(sort_order)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Validation(format!("A dues plan named '{}' already exists", request.name))
            } else {
                AppError::Database(e.to_string())
            }
        })?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created dues plan".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DuesPlan>> {
        let row = sqlx::query_as::<_, DuesPlanRow>(
            r#"
            SELECT id, name, fee_cents, sort_order, is_active, created_at, updated_at
            FROM dues_plans
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_plan).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<DuesPlan>> {
        let row = sqlx::query_as::<_, DuesPlanRow>(
            r#"
            SELECT id, name, fee_cents, sort_order, is_active, created_at, updated_at
            FROM dues_plans
            WHERE name = ? COLLATE NOCASE
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_plan).transpose()
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<DuesPlan>> {
        let query = if include_inactive {
            r#"
            SELECT id, name, fee_cents, sort_order, is_active, created_at, updated_at
            FROM dues_plans
            ORDER BY sort_order ASC, name ASC
            "#
        } else {
            r#"
            SELECT id, name, fee_cents, sort_order, is_active, created_at, updated_at
            FROM dues_plans
            WHERE is_active = 1
            ORDER BY sort_order ASC, name ASC
            "#
        };

        let rows = sqlx::query_as::<_, DuesPlanRow>(query)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_plan).collect()
    }

    async fn update(&self, id: Uuid, request: UpdateDuesPlanRequest) -> Result<DuesPlan> {
        let existing = self.find_by_id(id).await?.ok_or_else(|| {
            AppError::NotFound("Dues plan not found".to_string())
        })?;

        let fee_cents = request.fee_cents.unwrap_or(existing.fee_cents);
        let is_active = request.is_active.unwrap_or(existing.is_active);

        sqlx::query(
            r#"
            UPDATE dues_plans
            SET fee_cents = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(fee_cents)
        .bind(if is_active { 1i32 } else { 0i32 })
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated dues plan".to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM dues_plans WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
