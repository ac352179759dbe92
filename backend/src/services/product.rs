//! Product catalog service
//!
//! Product rows carry the authoritative `stock` count. This service never
//! changes stock outside a ledger-recording transaction: creation writes an
//! opening ledger entry, and all later movements go through the inventory
//! service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    CreateProductInput, PaginatedResponse, Pagination, PaginationMeta, Product, UpdateProductInput,
};
use shared::validation::validate_product_input;

#[derive(Debug, Clone)]
pub struct ProductService {
    db: PgPool,
}

#[derive(sqlx::FromRow)]
pub(crate) struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub flavor: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub cost: Decimal,
    pub wholesale_price: Option<Decimal>,
    pub stock: i32,
    pub barcode: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            flavor: row.flavor,
            description: row.description,
            price: row.price,
            cost: row.cost,
            wholesale_price: row.wholesale_price,
            stock: row.stock,
            barcode: row.barcode,
            created_at: row.created_at,
        }
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, flavor, description, price, cost, wholesale_price, stock, barcode, created_at";

/// Public storefront view of a product: no cost or margin data
#[derive(Debug, Clone, serde::Serialize)]
pub struct StorefrontProduct {
    pub id: Uuid,
    pub name: String,
    pub flavor: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub in_stock: bool,
    pub stock: i32,
}

impl From<Product> for StorefrontProduct {
    fn from(p: Product) -> Self {
        StorefrontProduct {
            id: p.id,
            name: p.name,
            flavor: p.flavor,
            description: p.description,
            price: p.price,
            in_stock: p.stock > 0,
            stock: p.stock,
        }
    }
}

impl ProductService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a product; a non-zero initial stock is recorded as an opening
    /// ledger entry in the same transaction
    pub async fn create(
        &self,
        input: CreateProductInput,
        user_id: Option<Uuid>,
    ) -> AppResult<Product> {
        validate_product_input(&input).map_err(|message| AppError::Validation {
            field: "product".to_string(),
            message: message.to_string(),
        })?;

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products (name, flavor, description, price, cost, wholesale_price, stock, barcode)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PRODUCT_COLUMNS}
            "#,
        ))
        .bind(input.name.trim())
        .bind(input.flavor.trim())
        .bind(&input.description)
        .bind(input.price)
        .bind(input.cost)
        .bind(input.wholesale_price)
        .bind(input.stock)
        .bind(&input.barcode)
        .fetch_one(&mut *tx)
        .await?;

        if input.stock != 0 {
            sqlx::query(
                r#"
                INSERT INTO inventory_entries (product_id, quantity, notes, user_id)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(row.id)
            .bind(input.stock)
            .bind("Initial stock")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(row.into())
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("product".to_string()))?;

        Ok(row.into())
    }

    pub async fn list(&self, pagination: Pagination) -> AppResult<PaginatedResponse<Product>> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            ORDER BY name, flavor
            LIMIT $1 OFFSET $2
            "#,
        ))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: rows.into_iter().map(Product::from).collect(),
            pagination: PaginationMeta::new(&pagination, total as u64),
        })
    }

    /// Every product, in mirror order; used by the full external resync
    pub async fn all(&self) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, flavor"
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Search by name, flavor or barcode
    pub async fn search(&self, query: &str) -> AppResult<Vec<Product>> {
        let pattern = format!("%{}%", query.trim());
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE name ILIKE $1 OR flavor ILIKE $1 OR barcode ILIKE $1
            ORDER BY name, flavor
            "#,
        ))
        .bind(pattern)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    pub async fn low_stock(&self, threshold: i32) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE stock <= $1
            ORDER BY stock, name
            "#,
        ))
        .bind(threshold)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Public storefront listing; excludes cost and margin figures
    pub async fn storefront(&self) -> AppResult<Vec<StorefrontProduct>> {
        let products = self.all().await?;
        Ok(products.into_iter().map(StorefrontProduct::from).collect())
    }

    /// Update catalog fields; stock is not updatable here
    pub async fn update(&self, id: Uuid, input: UpdateProductInput) -> AppResult<Product> {
        if let Some(price) = input.price {
            if price < Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "price".to_string(),
                    message: "Price cannot be negative".to_string(),
                });
            }
        }
        if let Some(cost) = input.cost {
            if cost < Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "cost".to_string(),
                    message: "Cost cannot be negative".to_string(),
                });
            }
        }

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                flavor = COALESCE($3, flavor),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                cost = COALESCE($6, cost),
                wholesale_price = COALESCE($7, wholesale_price),
                barcode = COALESCE($8, barcode)
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.flavor)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.cost)
        .bind(input.wholesale_price)
        .bind(&input.barcode)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("product".to_string()))?;

        Ok(row.into())
    }

    /// Delete a product and its ledger entries; returns the last state for
    /// the external mirror. Products referenced by orders cannot be deleted.
    pub async fn delete(&self, id: Uuid) -> AppResult<Product> {
        let product = self.get(id).await?;

        let (referenced,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM order_items WHERE product_id = $1")
                .bind(id)
                .fetch_one(&self.db)
                .await?;
        if referenced > 0 {
            return Err(AppError::Validation {
                field: "product_id".to_string(),
                message: "Product has order history and cannot be deleted".to_string(),
            });
        }

        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(product)
    }
}
