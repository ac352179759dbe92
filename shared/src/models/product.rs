//! Product catalog models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sellable product with its authoritative on-hand stock count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub flavor: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub cost: Decimal,
    pub wholesale_price: Option<Decimal>,
    /// On-hand count; mutated only through ledger-recording operations
    pub stock: i32,
    pub barcode: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Profit margin as a percentage of the sale price (0 when price is 0)
    pub fn profit_margin(&self) -> Decimal {
        if self.price > Decimal::ZERO {
            (self.price - self.cost) / self.price * Decimal::from(100)
        } else {
            Decimal::ZERO
        }
    }

    /// Retail value of the on-hand stock
    pub fn stock_value(&self) -> Decimal {
        self.price * Decimal::from(self.stock)
    }

    /// Display label used in messages and external mirrors
    pub fn label(&self) -> String {
        format!("{} {}", self.name, self.flavor)
    }
}

/// Input for creating a product
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductInput {
    pub name: String,
    pub flavor: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub cost: Decimal,
    pub wholesale_price: Option<Decimal>,
    /// Initial stock; recorded as an opening ledger entry when non-zero
    #[serde(default)]
    pub stock: i32,
    pub barcode: Option<String>,
}

/// Input for updating a product
///
/// Stock is deliberately absent: stock changes go through the inventory
/// ledger so every mutation leaves an audit record.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub flavor: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub wholesale_price: Option<Decimal>,
    pub barcode: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn product(price: &str, cost: &str, stock: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Cola".to_string(),
            flavor: "Classic".to_string(),
            description: None,
            price: Decimal::from_str(price).unwrap(),
            cost: Decimal::from_str(cost).unwrap(),
            wholesale_price: None,
            stock,
            barcode: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn profit_margin_is_percentage_of_price() {
        let p = product("100", "60", 5);
        assert_eq!(p.profit_margin(), Decimal::from(40));
    }

    #[test]
    fn profit_margin_zero_price() {
        let p = product("0", "60", 5);
        assert_eq!(p.profit_margin(), Decimal::ZERO);
    }

    #[test]
    fn stock_value_multiplies_price_by_stock() {
        let p = product("25.50", "10", 4);
        assert_eq!(p.stock_value(), Decimal::from_str("102.00").unwrap());
    }
}
