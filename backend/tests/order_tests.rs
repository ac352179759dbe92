//! Order semantics tests
//!
//! Order totals are derived from per-line price snapshots taken at sale
//! time, so later catalog price changes must not move historical totals.

use chrono::Utc;
use rust_decimal::Decimal;
use shared::models::{
    Order, OrderChangeEvent, OrderItem, OrderStatus, OrderWithItems, PaymentStatus, Product,
    ProductChangeEvent, SyncAction, SyncState, SystemDescriptor, UserAttribution,
};
use std::str::FromStr;
use uuid::Uuid;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn item(order_id: Uuid, name: &str, quantity: i32, price: &str) -> OrderItem {
    OrderItem {
        id: Uuid::new_v4(),
        order_id,
        product_id: Uuid::new_v4(),
        product_name: name.to_string(),
        flavor: "Classic".to_string(),
        quantity,
        price: dec(price),
    }
}

fn order_with(items: Vec<OrderItem>) -> OrderWithItems {
    let total: Decimal = items.iter().map(|i| i.subtotal()).sum();
    let order_id = items.first().map(|i| i.order_id).unwrap_or_else(Uuid::new_v4);
    OrderWithItems {
        order: Order {
            id: order_id,
            customer_id: Uuid::new_v4(),
            customer_name: Some("Somchai".to_string()),
            order_date: Utc::now(),
            total_amount: total,
            shipping_address: None,
            payment_status: PaymentStatus::Pending,
            status: OrderStatus::Pending,
            notes: None,
        },
        items,
    }
}

mod unit_tests {
    use super::*;

    #[test]
    fn total_is_the_sum_of_line_subtotals() {
        let order_id = Uuid::new_v4();
        let order = order_with(vec![
            item(order_id, "Cola", 3, "19.50"),
            item(order_id, "Fanta", 2, "15.00"),
        ]);

        assert_eq!(order.order.total_amount, dec("88.50"));
        assert_eq!(order.item_count(), 5);
    }

    #[test]
    fn snapshot_prices_are_immune_to_catalog_changes() {
        let order_id = Uuid::new_v4();
        let order = order_with(vec![item(order_id, "Cola", 4, "25.00")]);

        // The catalog price changes after the sale; the order keeps the
        // price it was sold at
        let catalog_price = dec("40.00");
        assert_ne!(order.items[0].price, catalog_price);
        assert_eq!(order.items[0].price, dec("25.00"));
        assert_eq!(order.items[0].subtotal(), dec("100.00"));
        assert_eq!(order.order.total_amount, dec("100.00"));
    }

    #[test]
    fn statuses_default_to_pending() {
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(OrderStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn order_serializes_with_flattened_header() {
        let order_id = Uuid::new_v4();
        let order = order_with(vec![item(order_id, "Cola", 1, "50")]);
        let json = serde_json::to_value(&order).unwrap();

        // Header fields sit at the top level next to items
        assert_eq!(json["id"], serde_json::json!(order_id.to_string()));
        assert_eq!(json["payment_status"], "pending");
        assert!(json["items"].is_array());
    }
}

mod webhook_payload_tests {
    use super::*;

    fn sample_product(stock: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Cola".to_string(),
            flavor: "Classic".to_string(),
            description: None,
            price: dec("50"),
            cost: dec("30"),
            wholesale_price: None,
            stock,
            barcode: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn order_event_reports_post_sale_stock() {
        let order_id = Uuid::new_v4();
        let line = item(order_id, "Cola", 7, "50");
        let product_id = line.product_id;
        let order = order_with(vec![line]);

        let event = OrderChangeEvent::new(
            &order,
            &[(product_id, 3)],
            SyncAction::Create,
            None,
            SystemDescriptor::new("development"),
            SyncState::new().snapshot(),
        );

        assert_eq!(event.event, "order_change");
        assert_eq!(event.order.items[0].new_stock_level, 3);
        assert_eq!(event.order.items[0].total_price, dec("350"));
        assert_eq!(event.order.total_amount, dec("350"));
    }

    #[test]
    fn events_embed_the_breaker_snapshot() {
        let mut state = SyncState::new();
        state.record_failure("timeout");

        let event = ProductChangeEvent::new(
            &sample_product(10),
            SyncAction::Update,
            Some(UserAttribution {
                user_id: Uuid::new_v4(),
            }),
            SystemDescriptor::new("production"),
            state.snapshot(),
        );

        assert!(event.sync_status.enabled);
        assert_eq!(event.sync_status.consecutive_errors, 1);
        assert_eq!(event.system.environment, "production");
        assert!(event.user.is_some());

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["action"], "UPDATE");
        assert_eq!(json["sync_status"]["consecutive_errors"], 1);
    }
}
