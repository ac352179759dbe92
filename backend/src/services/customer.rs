//! Customer management service

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{
    CreateCustomerInput, Customer, PaginatedResponse, Pagination, PaginationMeta,
};

#[derive(Debug, Clone)]
pub struct CustomerService {
    db: PgPool,
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    name: String,
    phone: Option<String>,
    address: Option<String>,
    line_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            phone: row.phone,
            address: row.address,
            line_id: row.line_id,
            created_at: row.created_at,
        }
    }
}

impl CustomerService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: CreateCustomerInput) -> AppResult<Customer> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "customer name must not be empty".to_string(),
            });
        }

        let row = sqlx::query_as::<_, CustomerRow>(
            r#"
            INSERT INTO customers (name, phone, address, line_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, phone, address, line_id, created_at
            "#,
        )
        .bind(name)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.line_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Customer> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, name, phone, address, line_id, created_at FROM customers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("customer".to_string()))?;

        Ok(row.into())
    }

    pub async fn list(&self, pagination: Pagination) -> AppResult<PaginatedResponse<Customer>> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, CustomerRow>(
            r#"
            SELECT id, name, phone, address, line_id, created_at
            FROM customers
            ORDER BY name
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: rows.into_iter().map(Customer::from).collect(),
            pagination: PaginationMeta::new(&pagination, total as u64),
        })
    }
}
