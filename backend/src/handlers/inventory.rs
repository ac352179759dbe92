//! Inventory ledger handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::{sync_product_change, MutationResponse, SyncSummary};
use crate::middleware::ActorId;
use crate::models::{
    AdjustStockInput, LedgerEntry, PaginatedResponse, Pagination, Product, ReconciliationRow,
    SyncAction,
};
use crate::AppState;

#[derive(serde::Serialize)]
pub struct AdjustmentData {
    pub product: Product,
    pub entry: LedgerEntry,
    pub low_stock: bool,
}

/// Manual restock or correction
pub async fn adjust_stock(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<(StatusCode, Json<MutationResponse<AdjustmentData>>)> {
    let adjusted = state.inventory.adjust(input, actor).await?;
    tracing::info!(
        product_id = %adjusted.product.id,
        quantity = adjusted.entry.quantity,
        "stock adjusted"
    );

    if adjusted.low_stock {
        if let Err(e) = state.notifications.notify_low_stock(&adjusted.product).await {
            tracing::error!(error = %e, "failed to record low-stock notification");
        }
    }

    let sync: SyncSummary =
        sync_product_change(&state, &adjusted.product, SyncAction::Update, actor).await;

    Ok((
        StatusCode::CREATED,
        Json(MutationResponse {
            data: AdjustmentData {
                product: adjusted.product,
                entry: adjusted.entry,
                low_stock: adjusted.low_stock,
            },
            sync,
        }),
    ))
}

#[derive(Deserialize)]
pub struct HistoryParams {
    pub product_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub async fn inventory_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> AppResult<Json<PaginatedResponse<LedgerEntry>>> {
    let defaults = Pagination::default();
    let pagination = Pagination {
        page: params.page.unwrap_or(defaults.page),
        per_page: params.per_page.unwrap_or(defaults.per_page),
    };
    Ok(Json(
        state
            .inventory
            .history(params.product_id, pagination)
            .await?,
    ))
}

/// Ledger-sum vs. stock comparison for every product
pub async fn reconcile_inventory(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ReconciliationRow>>> {
    Ok(Json(state.inventory.reconcile().await?))
}

pub async fn reconcile_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ReconciliationRow>> {
    Ok(Json(state.inventory.reconcile_product(id).await?))
}
