//! Shared types and models for the Marbo Shop retail platform
//!
//! This crate contains types shared between the backend and other
//! components of the system: domain models, webhook payloads, the
//! external-sync state machine, and input validation helpers.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
