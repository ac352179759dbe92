//! External-sync state machine
//!
//! The sync client mirrors local state into an external spreadsheet and a
//! webhook consumer. Both are best-effort: a sustained outage must not add
//! latency or noise to every local write, so the client carries a circuit
//! breaker that disables itself after [`SyncState::FAILURE_THRESHOLD`]
//! consecutive failed attempts. Re-enabling is an explicit administrative
//! action; there is no automatic half-open probing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::product::Product;

/// Action tag recorded with mirrored rows and webhook events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncAction {
    Add,
    Update,
    Delete,
    Create,
    Sale,
    Return,
}

impl SyncAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::Add => "ADD",
            SyncAction::Update => "UPDATE",
            SyncAction::Delete => "DELETE",
            SyncAction::Create => "CREATE",
            SyncAction::Sale => "SALE",
            SyncAction::Return => "RETURN",
        }
    }
}

/// Result of one best-effort sync operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// External store / webhook acknowledged the change
    Applied,
    /// Breaker open or integration not configured; no attempt was made
    Skipped,
    /// Attempted and failed; counted against the circuit breaker
    Failed,
}

impl SyncOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, SyncOutcome::Applied)
    }
}

/// One product's stock movement from an order, carried from the ledger
/// transaction to the mirror and webhook steps after commit
#[derive(Debug, Clone, Serialize)]
pub struct OrderStockChange {
    /// Product state after the movement was applied
    pub product: Product,
    /// Units moved, always positive; the action tag gives the direction
    pub quantity: i32,
    /// Unit price snapshotted on the order line
    pub price: Decimal,
}

/// Circuit-breaker state for the external sync client
///
/// Mutations happen under the owner's mutex; two racing failure reports
/// must each increment the counter, otherwise the breaker opens late.
#[derive(Debug, Clone)]
pub struct SyncState {
    enabled: bool,
    consecutive_errors: u32,
    last_error: Option<String>,
    last_success: Option<DateTime<Utc>>,
}

/// Read-only view of [`SyncState`], exposed on the admin surface and
/// attached to webhook payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStateSnapshot {
    pub enabled: bool,
    pub consecutive_errors: u32,
    pub last_error: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncState {
    /// Consecutive failures after which the breaker opens
    pub const FAILURE_THRESHOLD: u32 = 3;

    pub fn new() -> Self {
        Self {
            enabled: true,
            consecutive_errors: 0,
            last_error: None,
            last_success: None,
        }
    }

    /// Whether sync calls may be attempted
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    /// Record a successful external call: clears the error streak
    pub fn record_success(&mut self, at: DateTime<Utc>) {
        self.consecutive_errors = 0;
        self.last_error = None;
        self.last_success = Some(at);
    }

    /// Record a failed external call. Returns `true` when this failure
    /// tripped the breaker from enabled to disabled.
    pub fn record_failure(&mut self, error: impl Into<String>) -> bool {
        self.consecutive_errors += 1;
        self.last_error = Some(error.into());
        if self.enabled && self.consecutive_errors >= Self::FAILURE_THRESHOLD {
            self.enabled = false;
            true
        } else {
            false
        }
    }

    /// Administrative reset: back to the initial enabled state
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn snapshot(&self) -> SyncStateSnapshot {
        SyncStateSnapshot {
            enabled: self.enabled,
            consecutive_errors: self.consecutive_errors,
            last_error: self.last_error.clone(),
            last_success: self.last_success,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_enabled_with_clean_counters() {
        let state = SyncState::new();
        assert!(state.is_enabled());
        assert_eq!(state.consecutive_errors(), 0);
        assert!(state.snapshot().last_error.is_none());
    }

    #[test]
    fn opens_after_three_consecutive_failures() {
        let mut state = SyncState::new();
        assert!(!state.record_failure("timeout"));
        assert!(!state.record_failure("timeout"));
        assert!(state.record_failure("permission denied"));
        assert!(!state.is_enabled());
        // The tripping failure's message is retained
        assert_eq!(
            state.snapshot().last_error.as_deref(),
            Some("permission denied")
        );
    }

    #[test]
    fn success_resets_the_streak() {
        let mut state = SyncState::new();
        state.record_failure("one");
        state.record_failure("two");
        state.record_success(Utc::now());
        assert_eq!(state.consecutive_errors(), 0);
        assert!(state.is_enabled());
        assert!(state.snapshot().last_success.is_some());
    }

    #[test]
    fn reset_reopens_a_tripped_breaker() {
        let mut state = SyncState::new();
        for _ in 0..3 {
            state.record_failure("boom");
        }
        assert!(!state.is_enabled());
        state.reset();
        assert!(state.is_enabled());
        assert_eq!(state.consecutive_errors(), 0);
    }
}
