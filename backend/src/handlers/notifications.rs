//! Notification handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::Notification;
use crate::AppState;

pub async fn list_unread(State(state): State<AppState>) -> AppResult<Json<Vec<Notification>>> {
    Ok(Json(state.notifications.list_unread().await?))
}

pub async fn unread_count(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let count = state.notifications.unread_count().await?;
    Ok(Json(json!({ "unread": count })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    state.notifications.mark_read(id).await?;
    Ok(Json(json!({ "marked": 1 })))
}

pub async fn mark_all_read(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let marked = state.notifications.mark_all_read().await?;
    Ok(Json(json!({ "marked": marked })))
}
