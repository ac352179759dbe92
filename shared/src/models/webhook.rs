//! Webhook payload construction
//!
//! Payloads follow the automation consumer's contract: `event`, `action`,
//! ISO-8601 `timestamp` plus `timestamp_unix`, a nested `product` or
//! `order` object, optional `user` attribution, and a `system` descriptor.
//! Delivery is at-most-once, fire-and-forget.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{OrderWithItems, Product, SyncAction, SyncStateSnapshot};

pub const EVENT_PRODUCT_CHANGE: &str = "product_change";
pub const EVENT_ORDER_CHANGE: &str = "order_change";

/// Who performed the change, when known
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAttribution {
    pub user_id: Uuid,
}

/// Originating-system descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemDescriptor {
    pub source: String,
    pub version: String,
    pub environment: String,
}

impl SystemDescriptor {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            source: "marbo_shop_backend".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: environment.into(),
        }
    }
}

/// Product body embedded in a [`ProductChangeEvent`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookProduct {
    pub id: Uuid,
    pub name: String,
    pub flavor: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub cost: Decimal,
    pub wholesale_price: Option<Decimal>,
    pub stock: i32,
    pub barcode: Option<String>,
    pub profit_margin: Decimal,
    pub stock_value: Decimal,
}

impl From<&Product> for WebhookProduct {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            flavor: p.flavor.clone(),
            description: p.description.clone(),
            price: p.price,
            cost: p.cost,
            wholesale_price: p.wholesale_price,
            stock: p.stock,
            barcode: p.barcode.clone(),
            profit_margin: p.profit_margin(),
            stock_value: p.stock_value(),
        }
    }
}

/// Event sent when a product is added, updated, or deleted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductChangeEvent {
    pub event: String,
    pub action: SyncAction,
    pub timestamp: DateTime<Utc>,
    pub timestamp_unix: i64,
    pub product: WebhookProduct,
    pub user: Option<UserAttribution>,
    pub system: SystemDescriptor,
    pub sync_status: SyncStateSnapshot,
}

impl ProductChangeEvent {
    pub fn new(
        product: &Product,
        action: SyncAction,
        user: Option<UserAttribution>,
        system: SystemDescriptor,
        sync_status: SyncStateSnapshot,
    ) -> Self {
        let now = Utc::now();
        Self {
            event: EVENT_PRODUCT_CHANGE.to_string(),
            action,
            timestamp: now,
            timestamp_unix: now.timestamp(),
            product: WebhookProduct::from(product),
            user,
            system,
            sync_status,
        }
    }
}

/// Order line embedded in an [`OrderChangeEvent`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookOrderItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub flavor: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    /// Stock level after this change was applied locally
    pub new_stock_level: i32,
}

/// Order body embedded in an [`OrderChangeEvent`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookOrder {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: Option<String>,
    pub total_amount: Decimal,
    pub payment_status: String,
    pub status: String,
    pub order_date: DateTime<Utc>,
    pub items: Vec<WebhookOrderItem>,
    pub item_count: usize,
}

/// Event sent when an order is created or deleted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderChangeEvent {
    pub event: String,
    pub action: SyncAction,
    pub timestamp: DateTime<Utc>,
    pub timestamp_unix: i64,
    pub order: WebhookOrder,
    pub user: Option<UserAttribution>,
    pub system: SystemDescriptor,
    pub sync_status: SyncStateSnapshot,
}

impl OrderChangeEvent {
    pub fn new(
        order: &OrderWithItems,
        stock_levels: &[(Uuid, i32)],
        action: SyncAction,
        user: Option<UserAttribution>,
        system: SystemDescriptor,
        sync_status: SyncStateSnapshot,
    ) -> Self {
        let now = Utc::now();
        let items: Vec<WebhookOrderItem> = order
            .items
            .iter()
            .map(|item| WebhookOrderItem {
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                flavor: item.flavor.clone(),
                quantity: item.quantity,
                unit_price: item.price,
                total_price: item.subtotal(),
                new_stock_level: stock_levels
                    .iter()
                    .find(|(id, _)| *id == item.product_id)
                    .map(|(_, stock)| *stock)
                    .unwrap_or_default(),
            })
            .collect();

        Self {
            event: EVENT_ORDER_CHANGE.to_string(),
            action,
            timestamp: now,
            timestamp_unix: now.timestamp(),
            order: WebhookOrder {
                id: order.order.id,
                customer_id: order.order.customer_id,
                customer_name: order.order.customer_name.clone(),
                total_amount: order.order.total_amount,
                payment_status: order.order.payment_status.as_str().to_string(),
                status: order.order.status.as_str().to_string(),
                order_date: order.order.order_date,
                item_count: items.len(),
                items,
            },
            user,
            system,
            sync_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample_product() -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Cola".to_string(),
            flavor: "Classic".to_string(),
            description: None,
            price: Decimal::from_str("50").unwrap(),
            cost: Decimal::from_str("30").unwrap(),
            wholesale_price: None,
            stock: 10,
            barcode: Some("885000111".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn product_event_has_required_fields() {
        let product = sample_product();
        let event = ProductChangeEvent::new(
            &product,
            SyncAction::Add,
            None,
            SystemDescriptor::new("development"),
            SyncState::new().snapshot(),
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "product_change");
        assert_eq!(json["action"], "ADD");
        assert!(json["timestamp"].is_string());
        assert!(json["timestamp_unix"].is_i64());
        assert_eq!(json["product"]["stock"], 10);
        assert_eq!(json["system"]["source"], "marbo_shop_backend");
        assert!(json["user"].is_null());
    }

    #[test]
    fn product_event_derives_margin_and_value() {
        let product = sample_product();
        let event = ProductChangeEvent::new(
            &product,
            SyncAction::Update,
            None,
            SystemDescriptor::new("development"),
            SyncState::new().snapshot(),
        );
        assert_eq!(event.product.profit_margin, Decimal::from(40));
        assert_eq!(event.product.stock_value, Decimal::from(500));
    }

    use super::super::SyncState;
    use super::super::{Order, OrderItem, OrderStatus, PaymentStatus};

    #[test]
    fn order_event_carries_post_change_stock_levels() {
        let product_id = Uuid::new_v4();
        let order_id = Uuid::new_v4();
        let order = OrderWithItems {
            order: Order {
                id: order_id,
                customer_id: Uuid::new_v4(),
                customer_name: Some("Somchai".to_string()),
                order_date: Utc::now(),
                total_amount: Decimal::from(150),
                shipping_address: None,
                payment_status: PaymentStatus::Pending,
                status: OrderStatus::Pending,
                notes: None,
            },
            items: vec![OrderItem {
                id: Uuid::new_v4(),
                order_id,
                product_id,
                product_name: "Cola".to_string(),
                flavor: "Classic".to_string(),
                quantity: 3,
                price: Decimal::from(50),
            }],
        };

        let event = OrderChangeEvent::new(
            &order,
            &[(product_id, 7)],
            SyncAction::Create,
            Some(UserAttribution {
                user_id: Uuid::new_v4(),
            }),
            SystemDescriptor::new("production"),
            SyncState::new().snapshot(),
        );

        assert_eq!(event.order.items.len(), 1);
        assert_eq!(event.order.items[0].new_stock_level, 7);
        assert_eq!(event.order.items[0].total_price, Decimal::from(150));
        assert_eq!(event.order.item_count, 1);
        assert!(event.user.is_some());
    }
}
