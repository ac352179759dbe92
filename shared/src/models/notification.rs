//! In-app notification models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of notifications raised by the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    LowStock,
    NewOrder,
    SyncError,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::LowStock => "low_stock",
            NotificationKind::NewOrder => "new_order",
            NotificationKind::SyncError => "sync_error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low_stock" => Some(NotificationKind::LowStock),
            "new_order" => Some(NotificationKind::NewOrder),
            "sync_error" => Some(NotificationKind::SyncError),
            _ => None,
        }
    }
}

/// An in-app notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub kind: NotificationKind,
    /// Id of the related entity (product, order), if any
    pub related_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
