//! HTTP route handlers and shared application state.

pub mod carts;
pub mod health;
pub mod metrics;
pub mod payments;
pub mod sales;

use axum::http::HeaderMap;
use checkout::{CheckoutCoordinator, InMemoryDirectory, InMemoryPaymentGateway};
use stores::{AttemptLog, InMemoryCartStore, InMemoryCatalogStore, InMemorySaleStore};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
///
/// The catalog, cart, sale and directory stores are the in-memory
/// reference implementations; the attempt journal is pluggable so the
/// server can run against Postgres.
pub struct AppState<L: AttemptLog> {
    pub coordinator: CheckoutCoordinator<
        InMemoryCatalogStore,
        InMemoryCartStore,
        InMemorySaleStore,
        L,
        InMemoryDirectory,
    >,
    pub catalog: InMemoryCatalogStore,
    pub carts: InMemoryCartStore,
    pub sales: InMemorySaleStore,
    pub directory: InMemoryDirectory,
    pub gateway: InMemoryPaymentGateway,
}

/// Extracts the customer identity set by the auth middleware.
pub(crate) fn customer_email(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get("x-customer-email")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::Forbidden("No autorizado".to_string()))
}

/// Extracts the staff identity set by the auth middleware.
pub(crate) fn admin_user(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get("x-admin-user")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::Forbidden("No autorizado".to_string()))
}
