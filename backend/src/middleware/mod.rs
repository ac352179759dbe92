//! HTTP middleware for the Marbo Shop backend

pub mod auth;

pub use auth::{require_api_key, ActorId};
