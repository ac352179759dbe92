//! API route definitions
//!
//! Everything requires the static API key except the health check and the
//! public storefront stock view.

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::middleware::require_api_key;
use crate::AppState;

pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // Public routes
        .route("/health", get(handlers::health::health_check))
        .route("/public/stock", get(handlers::products::public_stock))
        // Protected routes - catalog and sales
        .nest("/products", product_routes(state))
        .nest("/customers", customer_routes(state))
        .nest("/orders", order_routes(state))
        // Protected routes - inventory ledger
        .nest("/inventory", inventory_routes(state))
        // Protected routes - notifications and sync administration
        .nest("/notifications", notification_routes(state))
        .nest("/sync", sync_routes(state))
}

fn protected(state: &AppState, router: Router<AppState>) -> Router<AppState> {
    router.route_layer(from_fn_with_state(state.clone(), require_api_key))
}

fn product_routes(state: &AppState) -> Router<AppState> {
    protected(
        state,
        Router::new()
            .route(
                "/",
                get(handlers::products::list_products).post(handlers::products::create_product),
            )
            .route("/search", get(handlers::products::search_products))
            .route("/low-stock", get(handlers::products::low_stock_products))
            .route(
                "/:id",
                get(handlers::products::get_product)
                    .put(handlers::products::update_product)
                    .delete(handlers::products::delete_product),
            ),
    )
}

fn customer_routes(state: &AppState) -> Router<AppState> {
    protected(
        state,
        Router::new()
            .route(
                "/",
                get(handlers::customers::list_customers).post(handlers::customers::create_customer),
            )
            .route("/:id", get(handlers::customers::get_customer)),
    )
}

fn order_routes(state: &AppState) -> Router<AppState> {
    protected(
        state,
        Router::new()
            .route(
                "/",
                get(handlers::orders::list_orders).post(handlers::orders::create_order),
            )
            .route(
                "/:id",
                get(handlers::orders::get_order).delete(handlers::orders::delete_order),
            ),
    )
}

fn inventory_routes(state: &AppState) -> Router<AppState> {
    protected(
        state,
        Router::new()
            .route("/adjust", post(handlers::inventory::adjust_stock))
            .route("/history", get(handlers::inventory::inventory_history))
            .route("/reconcile", get(handlers::inventory::reconcile_inventory))
            .route(
                "/reconcile/:id",
                get(handlers::inventory::reconcile_product),
            ),
    )
}

fn notification_routes(state: &AppState) -> Router<AppState> {
    protected(
        state,
        Router::new()
            .route("/", get(handlers::notifications::list_unread))
            .route("/count", get(handlers::notifications::unread_count))
            .route("/read-all", post(handlers::notifications::mark_all_read))
            .route("/:id/read", post(handlers::notifications::mark_read)),
    )
}

fn sync_routes(state: &AppState) -> Router<AppState> {
    protected(
        state,
        Router::new()
            .route("/status", get(handlers::sync::sync_status))
            .route("/reset", post(handlers::sync::reset_sync))
            .route("/setup", post(handlers::sync::setup_sheets))
            .route("/full", post(handlers::sync::full_sync))
            .route("/test", post(handlers::sync::test_sync)),
    )
}
