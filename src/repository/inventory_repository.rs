use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{InventoryItem, RestockRequest},
    error::{AppError, Result},
    repository::InventoryRepository,
};

#[derive(FromRow)]
struct InventoryRow {
    id: String,
    name: String,
    unit_cost_cents: i64,
    unit_price_cents: i64,
    stock: i64,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteInventoryRepository {
    pool: SqlitePool,
}

impl SqliteInventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_item(row: InventoryRow) -> Result<InventoryItem> {
        Ok(InventoryItem {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            name: row.name,
            unit_cost_cents: row.unit_cost_cents,
            unit_price_cents: row.unit_price_cents,
            stock: row.stock,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl InventoryRepository for SqliteInventoryRepository {
    async fn restock(&self, request: &RestockRequest) -> Result<InventoryItem> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO inventory_items (id, name, unit_cost_cents, unit_price_cents, stock, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (name) DO UPDATE SET
                unit_cost_cents = excluded.unit_cost_cents,
                unit_price_cents = excluded.unit_price_cents,
                stock = inventory_items.stock + excluded.stock,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&request.name)
        .bind(request.unit_cost_cents)
        .bind(request.unit_price_cents)
        .bind(request.quantity)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, InventoryRow>(
            r#"
            SELECT id, name, unit_cost_cents, unit_price_cents, stock, created_at, updated_at
            FROM inventory_items
            WHERE name = ?
            "#,
        )
        .bind(&request.name)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_item(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<InventoryItem>> {
        let row = sqlx::query_as::<_, InventoryRow>(
            r#"
            SELECT id, name, unit_cost_cents, unit_price_cents, stock, created_at, updated_at
            FROM inventory_items
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_item).transpose()
    }

    async fn list(&self) -> Result<Vec<InventoryItem>> {
        let rows = sqlx::query_as::<_, InventoryRow>(
            r#"
            SELECT id, name, unit_cost_cents, unit_price_cents, stock, created_at, updated_at
            FROM inventory_items
            ORDER BY name COLLATE NOCASE
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_item).collect()
    }

    async fn set_stock(&self, id: Uuid, stock: i64) -> Result<InventoryItem> {
        let result = sqlx::query("UPDATE inventory_items SET stock = ?, updated_at = ? WHERE id = ?")
            .bind(stock)
            .bind(Utc::now().naive_utc())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Inventory item not found".to_string()));
        }
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory item not found".to_string()))
    }

    async fn adjust_stock(&self, id: Uuid, delta: i64) -> Result<InventoryItem> {
        // The guard keeps concurrent sales from taking stock below zero
        let result = sqlx::query(
            r#"
            UPDATE inventory_items
            SET stock = stock + ?, updated_at = ?
            WHERE id = ? AND stock + ? >= 0
            "#,
        )
        .bind(delta)
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .bind(delta)
        .execute(&self.pool)
        .await?;

        let item = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Inventory item not found".to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::Validation(format!(
                "Not enough stock: {} has {} left",
                item.name, item.stock
            )));
        }
        Ok(item)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Inventory item not found".to_string()));
        }
        Ok(())
    }
}
