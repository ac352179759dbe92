//! Data models for the Marbo Shop backend
//!
//! The model types live in the `shared` crate; this module re-exports them
//! so backend code has a single import path.

pub use shared::models::*;
pub use shared::types::{PaginatedResponse, Pagination, PaginationMeta};
