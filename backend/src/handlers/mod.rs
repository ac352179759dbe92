//! HTTP request handlers
//!
//! Mutating handlers follow one shape: commit the local transaction first,
//! then run the external sync steps and report their outcomes alongside the
//! data. A sync failure is logged and surfaced in the response body but
//! never fails the request.

pub mod customers;
pub mod health;
pub mod inventory;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod sync;

use serde::Serialize;
use uuid::Uuid;

use crate::models::{
    OrderChangeEvent, OrderStockChange, OrderWithItems, Product, ProductChangeEvent, SyncAction,
    SyncOutcome, UserAttribution,
};
use crate::AppState;

/// Outcomes of the post-commit sync steps, echoed to the caller
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SyncSummary {
    pub sheets: SyncOutcome,
    pub webhook: SyncOutcome,
}

/// Body for mutations: the committed data plus sync outcomes
#[derive(Debug, Serialize)]
pub struct MutationResponse<T> {
    pub data: T,
    pub sync: SyncSummary,
}

fn attribution(actor: Option<Uuid>) -> Option<UserAttribution> {
    actor.map(|user_id| UserAttribution { user_id })
}

/// Mirror a product change and deliver its webhook event
pub(crate) async fn sync_product_change(
    state: &AppState,
    product: &Product,
    action: SyncAction,
    actor: Option<Uuid>,
) -> SyncSummary {
    let sheets = state.sync.mirror_product(product, action, actor).await;

    let event = ProductChangeEvent::new(
        product,
        action,
        attribution(actor),
        state.sync.system(),
        state.sync.snapshot(),
    );
    let webhook = state.sync.notify_webhook(&event).await;

    SyncSummary { sheets, webhook }
}

/// Mirror an order's stock movements and deliver its webhook event
pub(crate) async fn sync_order_change(
    state: &AppState,
    order: &OrderWithItems,
    changes: &[OrderStockChange],
    sheet_action: SyncAction,
    event_action: SyncAction,
    actor: Option<Uuid>,
) -> SyncSummary {
    let sheets = state
        .sync
        .mirror_order(order.order.id, sheet_action, changes, actor)
        .await;

    let stock_levels: Vec<(Uuid, i32)> = changes
        .iter()
        .map(|c| (c.product.id, c.product.stock))
        .collect();
    let event = OrderChangeEvent::new(
        order,
        &stock_levels,
        event_action,
        attribution(actor),
        state.sync.system(),
        state.sync.snapshot(),
    );
    let webhook = state.sync.notify_webhook(&event).await;

    SyncSummary { sheets, webhook }
}
