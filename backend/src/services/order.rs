//! Order query service
//!
//! Order creation and deletion mutate stock and therefore live in the
//! inventory service; this service covers the read side.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    Order, OrderItem, OrderStatus, OrderWithItems, PaginatedResponse, PaginationMeta,
    PaymentStatus, Pagination,
};

#[derive(Debug, Clone)]
pub struct OrderService {
    db: PgPool,
}

#[derive(sqlx::FromRow)]
pub(crate) struct OrderRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: Option<String>,
    pub order_date: DateTime<Utc>,
    pub total_amount: Decimal,
    pub shipping_address: Option<String>,
    pub payment_status: String,
    pub status: String,
    pub notes: Option<String>,
}

#[derive(sqlx::FromRow)]
pub(crate) struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub flavor: String,
    pub quantity: i32,
    pub price: Decimal,
}

pub(crate) fn parse_payment_status(value: &str) -> AppResult<PaymentStatus> {
    match value {
        "pending" => Ok(PaymentStatus::Pending),
        "paid" => Ok(PaymentStatus::Paid),
        other => Err(AppError::Internal(format!(
            "unknown payment status: {}",
            other
        ))),
    }
}

pub(crate) fn parse_order_status(value: &str) -> AppResult<OrderStatus> {
    match value {
        "pending" => Ok(OrderStatus::Pending),
        "shipped" => Ok(OrderStatus::Shipped),
        "completed" => Ok(OrderStatus::Completed),
        "cancelled" => Ok(OrderStatus::Cancelled),
        other => Err(AppError::Internal(format!("unknown order status: {}", other))),
    }
}

impl OrderRow {
    pub(crate) fn into_model(self) -> AppResult<Order> {
        Ok(Order {
            id: self.id,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            order_date: self.order_date,
            total_amount: self.total_amount,
            shipping_address: self.shipping_address,
            payment_status: parse_payment_status(&self.payment_status)?,
            status: parse_order_status(&self.status)?,
            notes: self.notes,
        })
    }
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_name: row.product_name,
            flavor: row.flavor,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

const ORDER_COLUMNS: &str = "o.id, o.customer_id, c.name AS customer_name, o.order_date, \
     o.total_amount, o.shipping_address, o.payment_status, o.status, o.notes";

const ITEM_COLUMNS: &str = "oi.id, oi.order_id, oi.product_id, p.name AS product_name, \
     p.flavor, oi.quantity, oi.price";

impl OrderService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<OrderWithItems> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders o
            JOIN customers c ON c.id = o.customer_id
            WHERE o.id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_string()))?;

        let items = self.items_for(id).await?;

        Ok(OrderWithItems {
            order: row.into_model()?,
            items,
        })
    }

    pub async fn list(&self, pagination: Pagination) -> AppResult<PaginatedResponse<OrderWithItems>> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders o
            JOIN customers c ON c.id = o.customer_id
            ORDER BY o.order_date DESC
            LIMIT $1 OFFSET $2
            "#,
        ))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let mut data = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.items_for(row.id).await?;
            data.push(OrderWithItems {
                order: row.into_model()?,
                items,
            });
        }

        Ok(PaginatedResponse {
            data,
            pagination: PaginationMeta::new(&pagination, total as u64),
        })
    }

    async fn items_for(&self, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
        let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            r#"
            SELECT {ITEM_COLUMNS}
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY p.name
            "#,
        ))
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(OrderItem::from).collect())
    }
}
