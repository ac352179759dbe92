//! In-app notification service

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Notification, NotificationKind, Product};

#[derive(Debug, Clone)]
pub struct NotificationService {
    db: PgPool,
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    message: String,
    kind: String,
    related_id: Option<Uuid>,
    is_read: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl NotificationRow {
    fn into_model(self) -> AppResult<Notification> {
        let kind = NotificationKind::parse(&self.kind)
            .ok_or_else(|| AppError::Internal(format!("unknown notification kind: {}", self.kind)))?;
        Ok(Notification {
            id: self.id,
            message: self.message,
            kind,
            related_id: self.related_id,
            is_read: self.is_read,
            created_at: self.created_at,
        })
    }
}

impl NotificationService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        kind: NotificationKind,
        message: String,
        related_id: Option<Uuid>,
    ) -> AppResult<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            INSERT INTO notifications (message, kind, related_id)
            VALUES ($1, $2, $3)
            RETURNING id, message, kind, related_id, is_read, created_at
            "#,
        )
        .bind(&message)
        .bind(kind.as_str())
        .bind(related_id)
        .fetch_one(&self.db)
        .await?;

        row.into_model()
    }

    /// Raised when a stock movement leaves a product at or below the
    /// configured threshold
    pub async fn notify_low_stock(&self, product: &Product) -> AppResult<Notification> {
        let message = format!(
            "สินค้า {} เหลือน้อย (คงเหลือ: {})",
            product.label(),
            product.stock
        );
        self.create(NotificationKind::LowStock, message, Some(product.id))
            .await
    }

    pub async fn notify_new_order(&self, order_id: Uuid, item_count: i32) -> AppResult<Notification> {
        let message = format!("มีคำสั่งซื้อใหม่ ({} รายการ)", item_count);
        self.create(NotificationKind::NewOrder, message, Some(order_id))
            .await
    }

    /// Raised when the sync client hits a failure the operator should see
    /// (denied access, rejected request, breaker tripping)
    pub async fn notify_sync_error(&self, detail: &str) -> AppResult<Notification> {
        let message = format!("การซิงค์ข้อมูลภายนอกล้มเหลว: {}", detail);
        self.create(NotificationKind::SyncError, message, None).await
    }

    pub async fn list_unread(&self) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, message, kind, related_id, is_read, created_at
            FROM notifications
            WHERE is_read = FALSE
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(NotificationRow::into_model).collect()
    }

    pub async fn unread_count(&self) -> AppResult<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE is_read = FALSE")
                .fetch_one(&self.db)
                .await?;
        Ok(count)
    }

    pub async fn mark_read(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("notification".to_string()));
        }
        Ok(())
    }

    pub async fn mark_all_read(&self) -> AppResult<u64> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE is_read = FALSE")
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }
}
