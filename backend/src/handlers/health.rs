//! Health check handler

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let database = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "healthy",
        Err(e) => {
            tracing::error!(error = %e, "database health check failed");
            "unhealthy"
        }
    };

    Json(json!({
        "status": "ok",
        "database": database,
        "sync_enabled": state.sync.is_enabled(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
