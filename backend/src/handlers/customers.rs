//! Customer handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{CreateCustomerInput, Customer, PaginatedResponse, Pagination};
use crate::AppState;

pub async fn list_customers(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<Customer>>> {
    Ok(Json(state.customers.list(pagination).await?))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Customer>> {
    Ok(Json(state.customers.get(id).await?))
}

pub async fn create_customer(
    State(state): State<AppState>,
    Json(input): Json<CreateCustomerInput>,
) -> AppResult<(StatusCode, Json<Customer>)> {
    let customer = state.customers.create(input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}
