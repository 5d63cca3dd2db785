use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{check_quantity, InventoryItem, InventoryValuation, RestockRequest},
    error::{AppError, Result},
    repository::InventoryRepository,
};

pub struct InventoryService {
    repo: Arc<dyn InventoryRepository>,
}

impl InventoryService {
    pub fn new(repo: Arc<dyn InventoryRepository>) -> Self {
        Self { repo }
    }

    /// Creates the item, or raises the stock of an existing one and sets its
    /// cost and price.
    pub async fn restock(&self, request: RestockRequest) -> Result<InventoryItem> {
        let request = request.normalized();
        request.validate()?;

        let item = self.repo.restock(&request).await?;
        tracing::info!(
            item = %item.name,
            added = request.quantity,
            stock = item.stock,
            "Inventory restocked"
        );
        Ok(item)
    }

    pub async fn list(&self) -> Result<Vec<InventoryItem>> {
        self.repo.list().await
    }

    pub async fn set_stock(&self, id: Uuid, stock: i64) -> Result<InventoryItem> {
        check_quantity(stock)?;

        let item = self.repo.set_stock(id, stock).await?;
        tracing::info!(item = %item.name, stock = item.stock, "Inventory stock set");
        Ok(item)
    }

    /// Takes `quantity` units out of stock.
    pub async fn sell(&self, id: Uuid, quantity: i64) -> Result<InventoryItem> {
        if quantity == 0 {
            return Err(AppError::Validation("Quantity must be greater than zero".to_string()));
        }
        check_quantity(quantity)?;

        let item = self.repo.adjust_stock(id, -quantity).await?;
        tracing::info!(item = %item.name, sold = quantity, stock = item.stock, "Inventory sold");
        Ok(item)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let item = self.repo.find_by_id(id).await?.ok_or_else(|| {
            AppError::NotFound("Inventory item not found".to_string())
        })?;

        self.repo.delete(id).await?;
        tracing::info!(item = %item.name, "Inventory item deleted");
        Ok(())
    }

    pub async fn valuation(&self) -> Result<InventoryValuation> {
        InventoryValuation::of(&self.repo.list().await?)
    }
}
