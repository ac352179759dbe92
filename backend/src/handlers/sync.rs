//! External-sync administration handlers

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::services::sync::ConnectionTest;
use crate::AppState;

/// Circuit-breaker state and counters
pub async fn sync_status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "sync": state.sync.snapshot() }))
}

/// Reopen a tripped breaker; the only path back to enabled
pub async fn reset_sync(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.sync.reset();
    Json(json!({ "sync": snapshot }))
}

/// Create the mirror sheets and headers if missing
pub async fn setup_sheets(State(state): State<AppState>) -> Json<Value> {
    let outcome = state.sync.ensure_structure().await;
    Json(json!({ "outcome": outcome, "sync": state.sync.snapshot() }))
}

/// Rewrite the current-state sheet from the local catalog
pub async fn full_sync(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let products = state.products.all().await?;
    let outcome = state.sync.sync_all_products(&products).await;
    Ok(Json(json!({
        "outcome": outcome,
        "products": products.len(),
        "sync": state.sync.snapshot(),
    })))
}

/// Connectivity probe against the spreadsheet service
pub async fn test_sync(State(state): State<AppState>) -> Json<ConnectionTest> {
    Json(state.sync.test_connection().await)
}
