//! HTTP API server with observability for the marketplace checkout.
//!
//! Provides the cart, sale and payment endpoints over the settlement
//! workflow, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use checkout::{CheckoutCoordinator, InMemoryDirectory, InMemoryPaymentGateway};
use metrics_exporter_prometheus::PrometheusHandle;
use stores::{AttemptLog, InMemoryAttemptLog, InMemoryCartStore, InMemoryCatalogStore, InMemorySaleStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<L: AttemptLog + 'static>(
    state: Arc<AppState<L>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/carrito", post(routes::carts::create::<L>))
        .route("/carrito", put(routes::carts::update::<L>))
        .route("/carrito", get(routes::carts::get::<L>))
        .route("/compras", get(routes::carts::purchases::<L>))
        .route("/ventas", post(routes::sales::create::<L>))
        .route("/ventas", get(routes::sales::list::<L>))
        .route("/ventas/web", post(routes::sales::create_web::<L>))
        .route("/ventas/total", get(routes::sales::total::<L>))
        .route("/ventas/top", get(routes::sales::top::<L>))
        .route("/pagos/preference", post(routes::payments::create_preference::<L>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over the in-memory stores with the given
/// attempt journal.
pub fn create_state_with_log<L: AttemptLog + 'static>(log: L) -> Arc<AppState<L>> {
    let catalog = InMemoryCatalogStore::new();
    let carts = InMemoryCartStore::new();
    let sales = InMemorySaleStore::new();
    let directory = InMemoryDirectory::new();
    let gateway = InMemoryPaymentGateway::new();

    let coordinator = CheckoutCoordinator::new(
        catalog.clone(),
        carts.clone(),
        sales.clone(),
        log,
        directory.clone(),
    );

    Arc::new(AppState {
        coordinator,
        catalog,
        carts,
        sales,
        directory,
        gateway,
    })
}

/// Creates the default application state with a fully in-memory stack.
pub fn create_default_state() -> Arc<AppState<InMemoryAttemptLog>> {
    create_state_with_log(InMemoryAttemptLog::new())
}
