//! Inventory ledger models
//!
//! Every stock change is a signed, immutable ledger entry tied to its
//! causing event. The per-product sum of entries must always equal the
//! product's current stock (reconciliation invariant).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable stock-change record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub product_id: Uuid,
    /// Signed delta: negative for sales, positive for restock/returns
    pub quantity: i32,
    pub entry_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub user_id: Option<Uuid>,
}

/// Input for a manual stock adjustment not tied to an order
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustStockInput {
    pub product_id: Uuid,
    /// Signed, non-zero delta
    pub quantity: i32,
    pub notes: Option<String>,
}

/// Reconciliation report row: ledger sum vs. authoritative stock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationRow {
    pub product_id: Uuid,
    pub product_name: String,
    pub flavor: String,
    pub stock: i32,
    pub ledger_sum: i64,
    pub consistent: bool,
}
