//! External sync service
//!
//! Mirrors local catalog and stock state into an external spreadsheet and
//! posts change events to a webhook consumer. Every call is best-effort:
//! local writes have already committed by the time this service runs, and
//! nothing here can fail a request.
//!
//! A circuit breaker guards the integration. After
//! [`SyncState::FAILURE_THRESHOLD`] consecutive failures the breaker opens
//! and every sync call becomes a no-op until an administrator resets it.
//! Missing credentials count as failures; an unset webhook URL is a plain
//! skip and counts nothing.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::SheetsConfig;
use crate::error::{AppError, AppResult};
use crate::external::{SheetsClient, WebhookClient};
use crate::models::{
    OrderStockChange, Product, SyncAction, SyncOutcome, SyncState, SyncStateSnapshot,
    SystemDescriptor,
};
use crate::services::NotificationService;

const PRODUCTS_SHEET: &str = "Products";
const INVENTORY_SHEET: &str = "Current_Inventory";
const TRANSACTIONS_SHEET: &str = "Stock_Transactions";

const PRODUCTS_HEADERS: [&str; 17] = [
    "Timestamp",
    "Action",
    "Product_ID",
    "Product_Name",
    "Flavor",
    "Description",
    "Price",
    "Cost",
    "Wholesale_Price",
    "Stock",
    "Barcode",
    "Profit_Margin",
    "Stock_Value",
    "User_ID",
    "User_Name",
    "Created_At",
    "Updated_At",
];

const INVENTORY_HEADERS: [&str; 12] = [
    "Product_ID",
    "Product_Name",
    "Flavor",
    "Description",
    "Price",
    "Cost",
    "Wholesale_Price",
    "Stock",
    "Barcode",
    "Profit_Margin",
    "Stock_Value",
    "Last_Updated",
];

const TRANSACTIONS_HEADERS: [&str; 12] = [
    "Timestamp",
    "Action",
    "Order_ID",
    "Product_ID",
    "Product_Name",
    "Flavor",
    "Quantity_Changed",
    "New_Stock_Level",
    "Unit_Price",
    "Total_Value",
    "User_ID",
    "User_Name",
];

#[derive(Clone)]
pub struct SyncService {
    sheets: SheetsClient,
    webhook: WebhookClient,
    sheets_config: SheetsConfig,
    state: Arc<Mutex<SyncState>>,
    notifications: NotificationService,
    environment: String,
}

/// Admin connectivity-test result
#[derive(Debug, Serialize)]
pub struct ConnectionTest {
    pub success: bool,
    pub sheets: Vec<String>,
    pub message: String,
}

impl SyncService {
    pub fn new(
        sheets: SheetsClient,
        webhook: WebhookClient,
        sheets_config: SheetsConfig,
        notifications: NotificationService,
        environment: String,
    ) -> Self {
        Self {
            sheets,
            webhook,
            sheets_config,
            state: Arc::new(Mutex::new(SyncState::new())),
            notifications,
            environment,
        }
    }

    fn state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_enabled(&self) -> bool {
        self.state().is_enabled()
    }

    pub fn snapshot(&self) -> SyncStateSnapshot {
        self.state().snapshot()
    }

    /// Administrative reset: reopens the breaker and clears counters
    pub fn reset(&self) -> SyncStateSnapshot {
        let mut state = self.state();
        state.reset();
        tracing::info!("external sync re-enabled by administrator");
        state.snapshot()
    }

    pub fn system(&self) -> SystemDescriptor {
        SystemDescriptor::new(self.environment.clone())
    }

    fn on_success(&self) {
        self.state().record_success(Utc::now());
    }

    fn on_failure(&self, operation: &str, err: &AppError) {
        let message = err.to_string();
        let tripped = self.state().record_failure(message.clone());

        tracing::warn!(operation, error = %message, "external sync call failed");

        if tripped {
            tracing::warn!(
                threshold = SyncState::FAILURE_THRESHOLD,
                "external sync disabled after repeated failures"
            );
        }

        // Access and contract problems need operator eyes; transient
        // transport noise does not
        let notify = tripped
            || matches!(
                err,
                AppError::ExternalAuth(_) | AppError::ExternalBadRequest(_)
            );
        if notify {
            let notifications = self.notifications.clone();
            let detail = if tripped {
                format!(
                    "sync disabled after {} consecutive failures: {}",
                    SyncState::FAILURE_THRESHOLD,
                    message
                )
            } else {
                message
            };
            tokio::spawn(async move {
                if let Err(e) = notifications.notify_sync_error(&detail).await {
                    tracing::error!(error = %e, "failed to record sync-error notification");
                }
            });
        }
    }

    /// Run one external call under the circuit breaker.
    ///
    /// Checks the breaker and the static configuration before touching the
    /// network, then records the outcome. Returns `None` when the call was
    /// skipped or failed.
    async fn guarded<T, F>(&self, operation: &'static str, call: F) -> Option<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        if !self.is_enabled() {
            tracing::debug!(operation, "external sync disabled, skipping");
            return None;
        }

        if let Err(message) = self.sheets_config.validate() {
            self.on_failure(operation, &AppError::ExternalConfig(message));
            return None;
        }

        match call.await {
            Ok(value) => {
                self.on_success();
                Some(value)
            }
            Err(err) => {
                self.on_failure(operation, &err);
                None
            }
        }
    }

    /// Make sure a sheet exists and carries its header row
    async fn ensure_sheet(&self, title: &str, headers: &[&str]) -> Option<()> {
        let titles = self.guarded("sheet_titles", self.sheets.sheet_titles()).await?;
        if !titles.iter().any(|t| t == title) {
            self.guarded("add_sheet", self.sheets.add_sheet(title)).await?;
        }

        let header_range = format!(
            "{}!A1:{}1",
            title,
            column_letter(headers.len())
        );
        let existing = self
            .guarded("read_headers", self.sheets.get_values(&header_range))
            .await?;

        let has_header = existing
            .first()
            .map(|row| !row.is_empty())
            .unwrap_or(false);
        if !has_header {
            let row = headers.iter().map(|h| json!(h)).collect();
            self.guarded(
                "write_headers",
                self.sheets.update_values(&header_range, vec![row]),
            )
            .await?;
        }

        Some(())
    }

    async fn ensure_structure_inner(&self) -> Option<()> {
        self.ensure_sheet(PRODUCTS_SHEET, &PRODUCTS_HEADERS).await?;
        self.ensure_sheet(INVENTORY_SHEET, &INVENTORY_HEADERS).await?;
        self.ensure_sheet(TRANSACTIONS_SHEET, &TRANSACTIONS_HEADERS)
            .await?;
        Some(())
    }

    /// Create the three mirror sheets and their headers if missing
    pub async fn ensure_structure(&self) -> SyncOutcome {
        if !self.is_enabled() {
            return SyncOutcome::Skipped;
        }
        match self.ensure_structure_inner().await {
            Some(()) => SyncOutcome::Applied,
            None => SyncOutcome::Failed,
        }
    }

    /// Mirror one product change: append to the change log and upsert the
    /// current-state row
    pub async fn mirror_product(
        &self,
        product: &Product,
        action: SyncAction,
        user_id: Option<Uuid>,
    ) -> SyncOutcome {
        if !self.is_enabled() {
            return SyncOutcome::Skipped;
        }

        let result = async {
            self.ensure_structure_inner().await?;

            let log_row = product_log_row(product, action, user_id);
            self.guarded(
                "append_product_log",
                self.sheets
                    .append_values(&format!("{}!A:Q", PRODUCTS_SHEET), vec![log_row]),
            )
            .await?;

            if action == SyncAction::Delete {
                self.remove_inventory_row(product.id).await
            } else {
                self.upsert_inventory_row(product).await
            }
        }
        .await;

        match result {
            Some(()) => SyncOutcome::Applied,
            None => SyncOutcome::Failed,
        }
    }

    /// Mirror an order's stock movements: one transaction row per line,
    /// then refresh each product's current-state row
    pub async fn mirror_order(
        &self,
        order_id: Uuid,
        action: SyncAction,
        changes: &[OrderStockChange],
        user_id: Option<Uuid>,
    ) -> SyncOutcome {
        if !self.is_enabled() {
            return SyncOutcome::Skipped;
        }

        let result = async {
            self.ensure_structure_inner().await?;

            let rows: Vec<Vec<Value>> = changes
                .iter()
                .map(|change| transaction_row(order_id, action, change, user_id))
                .collect();
            self.guarded(
                "append_transactions",
                self.sheets
                    .append_values(&format!("{}!A:L", TRANSACTIONS_SHEET), rows),
            )
            .await?;

            for change in changes {
                self.upsert_inventory_row(&change.product).await?;
            }
            Some(())
        }
        .await;

        match result {
            Some(()) => SyncOutcome::Applied,
            None => SyncOutcome::Failed,
        }
    }

    /// Rewrite the whole current-state sheet from the local catalog
    pub async fn sync_all_products(&self, products: &[Product]) -> SyncOutcome {
        if !self.is_enabled() {
            return SyncOutcome::Skipped;
        }

        let result = async {
            self.ensure_structure_inner().await?;

            let range = format!("{}!A:L", INVENTORY_SHEET);
            self.guarded("clear_inventory", self.sheets.clear_values(&range))
                .await?;

            let mut rows: Vec<Vec<Value>> =
                vec![INVENTORY_HEADERS.iter().map(|h| json!(h)).collect()];
            rows.extend(products.iter().map(inventory_row));

            let write_range = format!(
                "{}!A1:{}{}",
                INVENTORY_SHEET,
                column_letter(INVENTORY_HEADERS.len()),
                rows.len()
            );
            self.guarded(
                "write_inventory",
                self.sheets.update_values(&write_range, rows),
            )
            .await?;
            Some(())
        }
        .await;

        match result {
            Some(()) => SyncOutcome::Applied,
            None => SyncOutcome::Failed,
        }
    }

    /// Deliver a webhook payload; an unset URL is a plain skip
    pub async fn notify_webhook<T: Serialize>(&self, payload: &T) -> SyncOutcome {
        if !self.is_enabled() {
            return SyncOutcome::Skipped;
        }
        if !self.webhook.is_configured() {
            tracing::debug!("webhook url not configured, skipping");
            return SyncOutcome::Skipped;
        }

        match self.webhook.send(payload).await {
            Ok(()) => {
                self.on_success();
                SyncOutcome::Applied
            }
            Err(err) => {
                self.on_failure("notify_webhook", &err);
                SyncOutcome::Failed
            }
        }
    }

    /// Admin connectivity probe; counts against the breaker like any call
    pub async fn test_connection(&self) -> ConnectionTest {
        if !self.is_enabled() {
            return ConnectionTest {
                success: false,
                sheets: Vec::new(),
                message: "sync is disabled; reset the circuit breaker first".to_string(),
            };
        }

        match self.guarded("test_connection", self.sheets.sheet_titles()).await {
            Some(sheets) => ConnectionTest {
                success: true,
                message: format!("connected; {} sheets visible", sheets.len()),
                sheets,
            },
            None => ConnectionTest {
                success: false,
                sheets: Vec::new(),
                message: self
                    .snapshot()
                    .last_error
                    .unwrap_or_else(|| "connection failed".to_string()),
            },
        }
    }

    /// Find a product's row and overwrite it, or append when absent
    async fn upsert_inventory_row(&self, product: &Product) -> Option<()> {
        let range = format!("{}!A:L", INVENTORY_SHEET);
        let rows = self
            .guarded("read_inventory", self.sheets.get_values(&range))
            .await?;

        let row = inventory_row(product);
        match find_row_number(&rows, product.id) {
            Some(row_number) => {
                let target = format!(
                    "{}!A{}:{}{}",
                    INVENTORY_SHEET,
                    row_number,
                    column_letter(INVENTORY_HEADERS.len()),
                    row_number
                );
                self.guarded(
                    "update_inventory_row",
                    self.sheets.update_values(&target, vec![row]),
                )
                .await?;
            }
            None => {
                self.guarded(
                    "append_inventory_row",
                    self.sheets.append_values(&range, vec![row]),
                )
                .await?;
            }
        }
        Some(())
    }

    /// Blank out a deleted product's current-state row
    async fn remove_inventory_row(&self, product_id: Uuid) -> Option<()> {
        let range = format!("{}!A:L", INVENTORY_SHEET);
        let rows = self
            .guarded("read_inventory", self.sheets.get_values(&range))
            .await?;

        if let Some(row_number) = find_row_number(&rows, product_id) {
            let target = format!(
                "{}!A{}:{}{}",
                INVENTORY_SHEET,
                row_number,
                column_letter(INVENTORY_HEADERS.len()),
                row_number
            );
            self.guarded("clear_inventory_row", self.sheets.clear_values(&target))
                .await?;
        }
        Some(())
    }
}

/// 1-based column index to a spreadsheet column letter (1 = A, 26 = Z).
/// Mirror sheets never exceed one letter.
fn column_letter(index: usize) -> char {
    debug_assert!((1..=26).contains(&index));
    (b'A' + (index as u8 - 1).min(25)) as char
}

/// Scan data rows for a product id in the first column; returns the
/// 1-based sheet row number (header is row 1)
fn find_row_number(rows: &[Vec<Value>], product_id: Uuid) -> Option<usize> {
    let id = product_id.to_string();
    rows.iter()
        .enumerate()
        .skip(1)
        .find(|(_, row)| row.first().and_then(|v| v.as_str()) == Some(id.as_str()))
        .map(|(index, _)| index + 1)
}

fn user_cell(user_id: Option<Uuid>) -> Value {
    match user_id {
        Some(id) => json!(id.to_string()),
        None => json!(""),
    }
}

fn product_log_row(product: &Product, action: SyncAction, user_id: Option<Uuid>) -> Vec<Value> {
    let now = Utc::now();
    vec![
        json!(now.to_rfc3339()),
        json!(action.as_str()),
        json!(product.id.to_string()),
        json!(product.name),
        json!(product.flavor),
        json!(product.description.clone().unwrap_or_default()),
        json!(product.price),
        json!(product.cost),
        json!(product.wholesale_price),
        json!(product.stock),
        json!(product.barcode.clone().unwrap_or_default()),
        json!(product.profit_margin()),
        json!(product.stock_value()),
        user_cell(user_id),
        json!(""),
        json!(product.created_at.to_rfc3339()),
        json!(now.to_rfc3339()),
    ]
}

fn inventory_row(product: &Product) -> Vec<Value> {
    vec![
        json!(product.id.to_string()),
        json!(product.name),
        json!(product.flavor),
        json!(product.description.clone().unwrap_or_default()),
        json!(product.price),
        json!(product.cost),
        json!(product.wholesale_price),
        json!(product.stock),
        json!(product.barcode.clone().unwrap_or_default()),
        json!(product.profit_margin()),
        json!(product.stock_value()),
        json!(Utc::now().to_rfc3339()),
    ]
}

fn transaction_row(
    order_id: Uuid,
    action: SyncAction,
    change: &OrderStockChange,
    user_id: Option<Uuid>,
) -> Vec<Value> {
    // The tag gives the direction; SALE rows log a negative delta
    let quantity_changed = if action == SyncAction::Sale {
        -change.quantity
    } else {
        change.quantity
    };
    let total = change.price * rust_decimal::Decimal::from(change.quantity);

    vec![
        json!(Utc::now().to_rfc3339()),
        json!(action.as_str()),
        json!(order_id.to_string()),
        json!(change.product.id.to_string()),
        json!(change.product.name),
        json!(change.product.flavor),
        json!(quantity_changed),
        json!(change.product.stock),
        json!(change.price),
        json!(total),
        user_cell(user_id),
        json!(""),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn product(stock: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Cola".to_string(),
            flavor: "Classic".to_string(),
            description: None,
            price: Decimal::from(50),
            cost: Decimal::from(30),
            wholesale_price: None,
            stock,
            barcode: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn column_letters_cover_mirror_widths() {
        assert_eq!(column_letter(1), 'A');
        assert_eq!(column_letter(12), 'L');
        assert_eq!(column_letter(17), 'Q');
    }

    #[test]
    fn find_row_number_skips_header_and_is_one_based() {
        let target = Uuid::new_v4();
        let rows = vec![
            vec![json!("Product_ID"), json!("Product_Name")],
            vec![json!(Uuid::new_v4().to_string()), json!("Fanta")],
            vec![json!(target.to_string()), json!("Cola")],
        ];
        assert_eq!(find_row_number(&rows, target), Some(3));
        assert_eq!(find_row_number(&rows, Uuid::new_v4()), None);
    }

    #[test]
    fn find_row_number_ignores_a_row_that_matches_in_the_header() {
        let target = Uuid::new_v4();
        let rows = vec![vec![json!(target.to_string())]];
        // Row 1 is always the header, even if it looks like data
        assert_eq!(find_row_number(&rows, target), None);
    }

    #[test]
    fn product_log_row_matches_header_width() {
        let row = product_log_row(&product(10), SyncAction::Add, None);
        assert_eq!(row.len(), PRODUCTS_HEADERS.len());
        assert_eq!(row[1], json!("ADD"));
        assert_eq!(row[9], json!(10));
    }

    #[test]
    fn inventory_row_matches_header_width() {
        assert_eq!(inventory_row(&product(3)).len(), INVENTORY_HEADERS.len());
    }

    #[test]
    fn sale_transactions_log_negative_deltas() {
        let change = OrderStockChange {
            product: product(3),
            quantity: 7,
            price: Decimal::from(50),
        };
        let row = transaction_row(Uuid::new_v4(), SyncAction::Sale, &change, None);
        assert_eq!(row.len(), TRANSACTIONS_HEADERS.len());
        assert_eq!(row[6], json!(-7));
        assert_eq!(row[7], json!(3));
        assert_eq!(row[9], json!(Decimal::from(350)));

        let returned = transaction_row(Uuid::new_v4(), SyncAction::Return, &change, None);
        assert_eq!(returned[6], json!(7));
    }
}
