//! Validation helpers for the Marbo Shop retail platform
//!
//! Input validation happens before any state is touched: a rejected input
//! must leave no side effects.

use rust_decimal::Decimal;

use crate::models::{AdjustStockInput, CreateOrderInput, CreateProductInput};

/// Validate a new-order request shape (existence checks happen later,
/// inside the transaction)
pub fn validate_order_input(input: &CreateOrderInput) -> Result<(), &'static str> {
    if input.items.is_empty() {
        return Err("Order must contain at least one item");
    }
    for line in &input.items {
        if line.quantity <= 0 {
            return Err("Item quantity must be a positive integer");
        }
    }
    Ok(())
}

/// Validate a new product
pub fn validate_product_input(input: &CreateProductInput) -> Result<(), &'static str> {
    if input.name.trim().is_empty() {
        return Err("Product name is required");
    }
    if input.flavor.trim().is_empty() {
        return Err("Product flavor is required");
    }
    if input.price < Decimal::ZERO || input.cost < Decimal::ZERO {
        return Err("Price and cost cannot be negative");
    }
    if input.stock < 0 {
        return Err("Initial stock cannot be negative");
    }
    Ok(())
}

/// Validate a manual stock adjustment
pub fn validate_adjustment_input(input: &AdjustStockInput) -> Result<(), &'static str> {
    if input.quantity == 0 {
        return Err("Adjustment quantity cannot be zero");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderLineInput;
    use uuid::Uuid;

    fn order_input(quantities: &[i32]) -> CreateOrderInput {
        CreateOrderInput {
            customer_id: Uuid::new_v4(),
            items: quantities
                .iter()
                .map(|&q| OrderLineInput {
                    product_id: Uuid::new_v4(),
                    quantity: q,
                })
                .collect(),
            shipping_address: None,
            notes: None,
        }
    }

    #[test]
    fn rejects_empty_order() {
        assert!(validate_order_input(&order_input(&[])).is_err());
    }

    #[test]
    fn rejects_non_positive_quantities() {
        assert!(validate_order_input(&order_input(&[2, 0])).is_err());
        assert!(validate_order_input(&order_input(&[-1])).is_err());
        assert!(validate_order_input(&order_input(&[1, 2, 3])).is_ok());
    }

    #[test]
    fn rejects_zero_adjustment() {
        let input = AdjustStockInput {
            product_id: Uuid::new_v4(),
            quantity: 0,
            notes: None,
        };
        assert!(validate_adjustment_input(&input).is_err());
    }
}
