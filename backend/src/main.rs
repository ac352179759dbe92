//! Marbo Shop backend server
//!
//! Retail management API: product catalog, customers, orders, an append-only
//! inventory ledger, and best-effort mirroring into an external spreadsheet
//! and webhook consumer.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;
mod error;
mod external;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;

use config::Config;
use external::{SheetsClient, WebhookClient};
use services::{
    CustomerService, InventoryService, NotificationService, OrderService, ProductService,
    SyncService,
};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub products: ProductService,
    pub customers: CustomerService,
    pub orders: OrderService,
    pub inventory: InventoryService,
    pub notifications: NotificationService,
    pub sync: SyncService,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marbo_shop_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("failed to load configuration")?;
    tracing::info!(environment = %config.environment, "starting marbo shop backend");

    let db = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("failed to run migrations")?;

    let config = Arc::new(config);

    let notifications = NotificationService::new(db.clone());
    let sheets = SheetsClient::new(&config.sheets)?;
    let webhook = WebhookClient::new(&config.webhook)?;
    let sync = SyncService::new(
        sheets,
        webhook,
        config.sheets.clone(),
        notifications.clone(),
        config.environment.clone(),
    );

    if let Err(message) = config.sheets.validate() {
        tracing::warn!(%message, "spreadsheet sync is not fully configured");
    }

    let state = AppState {
        products: ProductService::new(db.clone()),
        customers: CustomerService::new(db.clone()),
        orders: OrderService::new(db.clone()),
        inventory: InventoryService::new(db.clone(), config.inventory.low_stock_threshold),
        notifications,
        sync,
        config: config.clone(),
        db,
    };

    let app = Router::new()
        .nest("/api/v1", routes::api_routes(&state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app)
        .await
        .context("server terminated")?;

    Ok(())
}
