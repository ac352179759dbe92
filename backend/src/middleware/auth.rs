//! Authentication boundary middleware
//!
//! Mutating API routes are gated by a static API key; full user/session
//! management lives outside this service. The optional `X-User-Id` header
//! carries the acting user for ledger attribution.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::error::AppError;
use crate::AppState;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the acting user's id, when known
pub const USER_ID_HEADER: &str = "x-user-id";

/// Middleware that validates the static API key on protected routes
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let expected = state.config.api.key.as_str();
    if expected.is_empty() {
        tracing::error!("api.key is not configured; rejecting request");
        return AppError::InvalidApiKey.into_response();
    }

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if key == expected => next.run(request).await,
        _ => AppError::InvalidApiKey.into_response(),
    }
}

/// Acting user extracted from the `X-User-Id` header, if present and valid
#[derive(Debug, Clone, Copy)]
pub struct ActorId(pub Option<Uuid>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for ActorId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v).ok());
        Ok(ActorId(actor))
    }
}
