//! Order handlers
//!
//! Order creation and deletion run through the inventory service so stock,
//! ledger entries and order rows move in one transaction. External sync
//! happens strictly after commit.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::{sync_order_change, MutationResponse};
use crate::middleware::ActorId;
use crate::models::{
    CreateOrderInput, OrderWithItems, PaginatedResponse, Pagination, SyncAction,
};
use crate::AppState;

pub async fn list_orders(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<OrderWithItems>>> {
    Ok(Json(state.orders.list(pagination).await?))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<OrderWithItems>> {
    Ok(Json(state.orders.get(id).await?))
}

pub async fn create_order(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<(StatusCode, Json<MutationResponse<OrderWithItems>>)> {
    let applied = state.inventory.apply_order(input, actor).await?;
    tracing::info!(
        order_id = %applied.order.order.id,
        total = %applied.order.order.total_amount,
        "order created"
    );

    if let Err(e) = state
        .notifications
        .notify_new_order(applied.order.order.id, applied.order.item_count())
        .await
    {
        tracing::error!(error = %e, "failed to record new-order notification");
    }
    for product in &applied.low_stock {
        if let Err(e) = state.notifications.notify_low_stock(product).await {
            tracing::error!(error = %e, "failed to record low-stock notification");
        }
    }

    let sync = sync_order_change(
        &state,
        &applied.order,
        &applied.changes,
        SyncAction::Sale,
        SyncAction::Create,
        actor,
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(MutationResponse {
            data: applied.order,
            sync,
        }),
    ))
}

/// Delete an order; sold stock goes back to the shelves
pub async fn delete_order(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MutationResponse<OrderWithItems>>> {
    let reversed = state.inventory.reverse_order(id, actor).await?;
    tracing::info!(order_id = %id, "order deleted, stock returned");

    let sync = sync_order_change(
        &state,
        &reversed.order,
        &reversed.changes,
        SyncAction::Return,
        SyncAction::Delete,
        actor,
    )
    .await;

    Ok(Json(MutationResponse {
        data: reversed.order,
        sync,
    }))
}
