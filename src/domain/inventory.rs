use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use super::{check_amount, checked_product, checked_total};

/// Largest stock a single item may hold, and the largest single adjustment.
pub const MAX_STOCK: i64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    /// What the academy pays per unit.
    pub unit_cost_cents: i64,
    /// What the academy charges per unit.
    pub unit_price_cents: i64,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn unit_profit_cents(&self) -> i64 {
        self.unit_price_cents - self.unit_cost_cents
    }

    /// Stock at sale price.
    pub fn stock_value_cents(&self) -> Result<i64> {
        checked_product(self.unit_price_cents, self.stock)
    }

    /// Stock at cost price.
    pub fn stock_cost_cents(&self) -> Result<i64> {
        checked_product(self.unit_cost_cents, self.stock)
    }
}

/// Totals over a set of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct InventoryValuation {
    pub cost_cents: i64,
    pub sale_cents: i64,
    /// Profit if every unit sells at its current price.
    pub potential_profit_cents: i64,
}

impl InventoryValuation {
    pub fn of(items: &[InventoryItem]) -> Result<Self> {
        let cost_cents = checked_total(
            items.iter().map(InventoryItem::stock_cost_cents).collect::<Result<Vec<_>>>()?,
        )?;
        let sale_cents = checked_total(
            items.iter().map(InventoryItem::stock_value_cents).collect::<Result<Vec<_>>>()?,
        )?;

        Ok(Self {
            cost_cents,
            sale_cents,
            potential_profit_cents: sale_cents - cost_cents,
        })
    }
}

/// Adds `quantity` units of `name`. An existing item takes the new cost and
/// price and the stock is increased.
#[derive(Debug, Clone, Deserialize)]
pub struct RestockRequest {
    pub name: String,
    #[serde(default)]
    pub unit_cost_cents: i64,
    pub unit_price_cents: i64,
    pub quantity: i64,
}

impl RestockRequest {
    pub fn normalized(self) -> Self {
        Self { name: self.name.trim().to_string(), ..self }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(AppError::Validation("Product name is required".to_string()));
        }
        check_amount(self.unit_cost_cents, "Cost")?;
        check_amount(self.unit_price_cents, "Price")?;
        if self.unit_cost_cents > self.unit_price_cents {
            return Err(AppError::Validation(
                "Cost cannot be higher than the sale price".to_string(),
            ));
        }
        check_quantity(self.quantity)
    }
}

pub fn check_quantity(quantity: i64) -> Result<()> {
    if quantity < 0 {
        return Err(AppError::Validation("Quantity cannot be negative".to_string()));
    }
    if quantity > MAX_STOCK {
        return Err(AppError::Validation(format!("Quantity cannot exceed {}", MAX_STOCK)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MAX_AMOUNT_CENTS;

    fn item(cost: i64, price: i64, stock: i64) -> InventoryItem {
        InventoryItem {
            id: Uuid::new_v4(),
            name: "Belt".to_string(),
            unit_cost_cents: cost,
            unit_price_cents: price,
            stock,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn request(cost: i64, price: i64, quantity: i64) -> RestockRequest {
        RestockRequest { name: "Belt".to_string(), unit_cost_cents: cost, unit_price_cents: price, quantity }
    }

    #[test]
    fn test_valuation() {
        let items = vec![item(40_000, 60_000, 10), item(1_000, 2_500, 4)];
        let valuation = InventoryValuation::of(&items).unwrap();

        assert_eq!(items[0].unit_profit_cents(), 20_000);
        assert_eq!(valuation.cost_cents, 404_000);
        assert_eq!(valuation.sale_cents, 610_000);
        assert_eq!(valuation.potential_profit_cents, 206_000);
        assert_eq!(InventoryValuation::of(&[]).unwrap(), InventoryValuation::default());
    }

    #[test]
    fn test_stock_value_overflow_is_an_error() {
        let huge = item(0, i64::MAX / 2, 3);
        assert!(matches!(huge.stock_value_cents(), Err(AppError::Validation(_))));

        let items = vec![item(0, i64::MAX / 4, 2), item(0, i64::MAX / 4, 2)];
        assert!(matches!(InventoryValuation::of(&items), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_restock_validation() {
        assert!(request(40_000, 60_000, 10).validate().is_ok());
        assert!(request(60_000, 60_000, 0).validate().is_ok());
        assert!(request(70_000, 60_000, 1).validate().is_err());
        assert!(request(-1, 60_000, 1).validate().is_err());
        assert!(request(0, MAX_AMOUNT_CENTS + 1, 1).validate().is_err());
        assert!(request(0, 100, MAX_STOCK + 1).validate().is_err());
        assert!(request(0, 100, -1).validate().is_err());
    }
}
