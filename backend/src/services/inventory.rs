//! Inventory ledger service
//!
//! All stock mutations happen here, inside a single database transaction
//! that locks the affected product rows, checks availability, updates the
//! authoritative counts and writes signed ledger entries. Either every
//! movement in a request lands or none do.
//!
//! Product rows are locked in ascending id order so two overlapping orders
//! can never deadlock against each other.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    AdjustStockInput, CreateOrderInput, LedgerEntry, Order, OrderItem, OrderStatus,
    OrderStockChange, OrderWithItems, PaginatedResponse, Pagination, PaginationMeta,
    PaymentStatus, Product, ReconciliationRow,
};
use crate::services::product::ProductRow;
use shared::validation::{validate_adjustment_input, validate_order_input};

#[derive(Debug, Clone)]
pub struct InventoryService {
    db: PgPool,
    low_stock_threshold: i32,
}

/// Result of a committed order: the order itself plus the stock movements
/// the caller mirrors externally after commit
#[derive(Debug)]
pub struct AppliedOrder {
    pub order: OrderWithItems,
    pub changes: Vec<OrderStockChange>,
    /// Products the order left at or below the low-stock threshold
    pub low_stock: Vec<Product>,
}

/// Result of deleting an order: stock has been returned to the shelves
#[derive(Debug)]
pub struct ReversedOrder {
    pub order: OrderWithItems,
    pub changes: Vec<OrderStockChange>,
}

/// Result of a manual stock adjustment
#[derive(Debug)]
pub struct AdjustedStock {
    pub product: Product,
    pub entry: LedgerEntry,
    pub low_stock: bool,
}

#[derive(sqlx::FromRow)]
struct LedgerRow {
    id: Uuid,
    product_id: Uuid,
    quantity: i32,
    entry_date: DateTime<Utc>,
    notes: Option<String>,
    user_id: Option<Uuid>,
}

impl From<LedgerRow> for LedgerEntry {
    fn from(row: LedgerRow) -> Self {
        LedgerEntry {
            id: row.id,
            product_id: row.product_id,
            quantity: row.quantity,
            entry_date: row.entry_date,
            notes: row.notes,
            user_id: row.user_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReconciliationDbRow {
    product_id: Uuid,
    product_name: String,
    flavor: String,
    stock: i32,
    ledger_sum: i64,
}

impl From<ReconciliationDbRow> for ReconciliationRow {
    fn from(row: ReconciliationDbRow) -> Self {
        ReconciliationRow {
            consistent: row.ledger_sum == i64::from(row.stock),
            product_id: row.product_id,
            product_name: row.product_name,
            flavor: row.flavor,
            stock: row.stock,
            ledger_sum: row.ledger_sum,
        }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, flavor, description, price, cost, wholesale_price, stock, barcode, created_at";

/// Lock one product row for update; returns its current state
async fn lock_product(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
) -> AppResult<Product> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
    ))
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("product".to_string()))?;

    Ok(row.into())
}

/// Apply a signed stock delta and record the matching ledger entry.
/// Caller must hold the row lock.
async fn move_stock(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
    delta: i32,
    notes: &str,
    user_id: Option<Uuid>,
) -> AppResult<(i32, LedgerEntry)> {
    let (new_stock,): (i32,) =
        sqlx::query_as("UPDATE products SET stock = stock + $2 WHERE id = $1 RETURNING stock")
            .bind(product_id)
            .bind(delta)
            .fetch_one(&mut **tx)
            .await?;

    let entry = sqlx::query_as::<_, LedgerRow>(
        r#"
        INSERT INTO inventory_entries (product_id, quantity, notes, user_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, product_id, quantity, entry_date, notes, user_id
        "#,
    )
    .bind(product_id)
    .bind(delta)
    .bind(notes)
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok((new_stock, entry.into()))
}

impl InventoryService {
    pub fn new(db: PgPool, low_stock_threshold: i32) -> Self {
        Self {
            db,
            low_stock_threshold,
        }
    }

    pub fn low_stock_threshold(&self) -> i32 {
        self.low_stock_threshold
    }

    /// Create an order and deduct stock for every line atomically.
    ///
    /// If any line's product is missing or short of stock, the whole
    /// transaction rolls back and no ledger entry, order row or stock
    /// change survives.
    pub async fn apply_order(
        &self,
        input: CreateOrderInput,
        user_id: Option<Uuid>,
    ) -> AppResult<AppliedOrder> {
        validate_order_input(&input).map_err(|message| AppError::Validation {
            field: "items".to_string(),
            message: message.to_string(),
        })?;

        // Merge duplicate product lines so each row is locked exactly once
        let mut lines: Vec<(Uuid, i32)> = Vec::new();
        for item in &input.items {
            match lines.iter_mut().find(|(id, _)| *id == item.product_id) {
                Some((_, qty)) => *qty += item.quantity,
                None => lines.push((item.product_id, item.quantity)),
            }
        }
        lines.sort_by_key(|(id, _)| *id);

        let mut tx = self.db.begin().await?;

        let customer_name: Option<(String,)> =
            sqlx::query_as("SELECT name FROM customers WHERE id = $1")
                .bind(input.customer_id)
                .fetch_optional(&mut *tx)
                .await?;
        let customer_name = customer_name
            .ok_or_else(|| AppError::NotFound("customer".to_string()))?
            .0;

        let (order_id, order_date): (Uuid, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO orders (customer_id, total_amount, shipping_address, notes)
            VALUES ($1, 0, $2, $3)
            RETURNING id, order_date
            "#,
        )
        .bind(input.customer_id)
        .bind(&input.shipping_address)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        let mut total = rust_decimal::Decimal::ZERO;
        let mut items = Vec::with_capacity(lines.len());
        let mut changes = Vec::with_capacity(lines.len());

        for (product_id, quantity) in lines {
            let product = lock_product(&mut tx, product_id).await?;

            if product.stock < quantity {
                return Err(AppError::InsufficientStock {
                    product: product.label(),
                    available: product.stock,
                    requested: quantity,
                });
            }

            let notes = format!("Order #{}", order_id);
            let (new_stock, _entry) =
                move_stock(&mut tx, product_id, -quantity, &notes, user_id).await?;

            let (item_id,): (Uuid,) = sqlx::query_as(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, price)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(order_id)
            .bind(product_id)
            .bind(quantity)
            .bind(product.price)
            .fetch_one(&mut *tx)
            .await?;

            total += product.price * rust_decimal::Decimal::from(quantity);

            items.push(OrderItem {
                id: item_id,
                order_id,
                product_id,
                product_name: product.name.clone(),
                flavor: product.flavor.clone(),
                quantity,
                price: product.price,
            });

            let mut after = product;
            after.stock = new_stock;
            changes.push(OrderStockChange {
                price: after.price,
                quantity,
                product: after,
            });
        }

        sqlx::query("UPDATE orders SET total_amount = $2 WHERE id = $1")
            .bind(order_id)
            .bind(total)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let low_stock = changes
            .iter()
            .filter(|c| c.product.stock <= self.low_stock_threshold)
            .map(|c| c.product.clone())
            .collect();

        let order = OrderWithItems {
            order: Order {
                id: order_id,
                customer_id: input.customer_id,
                customer_name: Some(customer_name),
                order_date,
                total_amount: total,
                shipping_address: input.shipping_address,
                payment_status: PaymentStatus::Pending,
                status: OrderStatus::Pending,
                notes: input.notes,
            },
            items,
        };

        Ok(AppliedOrder {
            order,
            changes,
            low_stock,
        })
    }

    /// Delete an order and return its stock to the shelves, atomically
    pub async fn reverse_order(
        &self,
        order_id: Uuid,
        user_id: Option<Uuid>,
    ) -> AppResult<ReversedOrder> {
        let mut tx = self.db.begin().await?;

        let order_row = sqlx::query_as::<_, crate::services::order::OrderRow>(
            r#"
            SELECT o.id, o.customer_id, c.name AS customer_name, o.order_date,
                   o.total_amount, o.shipping_address, o.payment_status, o.status, o.notes
            FROM orders o
            JOIN customers c ON c.id = o.customer_id
            WHERE o.id = $1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_string()))?;

        let mut item_rows = sqlx::query_as::<_, crate::services::order::OrderItemRow>(
            r#"
            SELECT oi.id, oi.order_id, oi.product_id, p.name AS product_name,
                   p.flavor, oi.quantity, oi.price
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;
        item_rows.sort_by_key(|r| r.product_id);

        let mut items = Vec::with_capacity(item_rows.len());
        let mut changes = Vec::with_capacity(item_rows.len());

        for row in item_rows {
            let product = lock_product(&mut tx, row.product_id).await?;

            let notes = format!("Return from order #{}", order_id);
            let (new_stock, _entry) =
                move_stock(&mut tx, row.product_id, row.quantity, &notes, user_id).await?;

            let mut after = product;
            after.stock = new_stock;
            changes.push(OrderStockChange {
                price: row.price,
                quantity: row.quantity,
                product: after,
            });
            items.push(OrderItem::from(row));
        }

        // order_items rows go with the order
        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(ReversedOrder {
            order: OrderWithItems {
                order: order_row.into_model()?,
                items,
            },
            changes,
        })
    }

    /// Manual restock or correction, recorded like any other movement
    pub async fn adjust(
        &self,
        input: AdjustStockInput,
        user_id: Option<Uuid>,
    ) -> AppResult<AdjustedStock> {
        validate_adjustment_input(&input).map_err(|message| AppError::Validation {
            field: "quantity".to_string(),
            message: message.to_string(),
        })?;

        let mut tx = self.db.begin().await?;

        let product = lock_product(&mut tx, input.product_id).await?;

        if input.quantity < 0 && product.stock + input.quantity < 0 {
            return Err(AppError::InsufficientStock {
                product: product.label(),
                available: product.stock,
                requested: -input.quantity,
            });
        }

        let notes = input
            .notes
            .clone()
            .unwrap_or_else(|| "Manual adjustment".to_string());
        let (new_stock, entry) =
            move_stock(&mut tx, input.product_id, input.quantity, &notes, user_id).await?;

        tx.commit().await?;

        let mut after = product;
        after.stock = new_stock;
        let low_stock = after.stock <= self.low_stock_threshold;

        Ok(AdjustedStock {
            product: after,
            entry,
            low_stock,
        })
    }

    /// Ledger history, newest first, optionally scoped to one product
    pub async fn history(
        &self,
        product_id: Option<Uuid>,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<LedgerEntry>> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM inventory_entries WHERE ($1::uuid IS NULL OR product_id = $1)",
        )
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT id, product_id, quantity, entry_date, notes, user_id
            FROM inventory_entries
            WHERE ($1::uuid IS NULL OR product_id = $1)
            ORDER BY entry_date DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(product_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: rows.into_iter().map(LedgerEntry::from).collect(),
            pagination: PaginationMeta::new(&pagination, total as u64),
        })
    }

    /// Compare each product's stock against its ledger sum
    pub async fn reconcile(&self) -> AppResult<Vec<ReconciliationRow>> {
        let rows = sqlx::query_as::<_, ReconciliationDbRow>(
            r#"
            SELECT p.id AS product_id, p.name AS product_name, p.flavor, p.stock,
                   COALESCE(SUM(e.quantity), 0)::BIGINT AS ledger_sum
            FROM products p
            LEFT JOIN inventory_entries e ON e.product_id = p.id
            GROUP BY p.id, p.name, p.flavor, p.stock
            ORDER BY p.name, p.flavor
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(ReconciliationRow::from).collect())
    }

    pub async fn reconcile_product(&self, product_id: Uuid) -> AppResult<ReconciliationRow> {
        let row = sqlx::query_as::<_, ReconciliationDbRow>(
            r#"
            SELECT p.id AS product_id, p.name AS product_name, p.flavor, p.stock,
                   COALESCE(SUM(e.quantity), 0)::BIGINT AS ledger_sum
            FROM products p
            LEFT JOIN inventory_entries e ON e.product_id = p.id
            WHERE p.id = $1
            GROUP BY p.id, p.name, p.flavor, p.stock
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("product".to_string()))?;

        Ok(row.into())
    }
}
