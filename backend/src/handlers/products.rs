//! Product catalog handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::{sync_product_change, MutationResponse};
use crate::middleware::ActorId;
use crate::models::{
    CreateProductInput, PaginatedResponse, Pagination, Product, SyncAction, UpdateProductInput,
};
use crate::services::product::StorefrontProduct;
use crate::AppState;

pub async fn list_products(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<Product>>> {
    Ok(Json(state.products.list(pagination).await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    Ok(Json(state.products.get(id).await?))
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
}

pub async fn search_products(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<Product>>> {
    Ok(Json(state.products.search(&params.q).await?))
}

pub async fn low_stock_products(State(state): State<AppState>) -> AppResult<Json<Vec<Product>>> {
    let threshold = state.inventory.low_stock_threshold();
    Ok(Json(state.products.low_stock(threshold).await?))
}

/// Unauthenticated storefront stock view
pub async fn public_stock(State(state): State<AppState>) -> AppResult<Json<Vec<StorefrontProduct>>> {
    Ok(Json(state.products.storefront().await?))
}

pub async fn create_product(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    Json(input): Json<CreateProductInput>,
) -> AppResult<(StatusCode, Json<MutationResponse<Product>>)> {
    let product = state.products.create(input, actor).await?;
    tracing::info!(product_id = %product.id, "product created");

    let sync = sync_product_change(&state, &product, SyncAction::Add, actor).await;

    Ok((
        StatusCode::CREATED,
        Json(MutationResponse {
            data: product,
            sync,
        }),
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<MutationResponse<Product>>> {
    let product = state.products.update(id, input).await?;

    let sync = sync_product_change(&state, &product, SyncAction::Update, actor).await;

    Ok(Json(MutationResponse {
        data: product,
        sync,
    }))
}

pub async fn delete_product(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MutationResponse<Product>>> {
    let product = state.products.delete(id).await?;
    tracing::info!(product_id = %product.id, "product deleted");

    let sync = sync_product_change(&state, &product, SyncAction::Delete, actor).await;

    Ok(Json(MutationResponse {
        data: product,
        sync,
    }))
}
