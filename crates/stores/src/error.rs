//! Store error types.

use common::{AttemptId, ProjectId};
use domain::DomainError;
use thiserror::Error;

/// Errors that can occur when interacting with the stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested product does not exist in the catalog.
    #[error("Producto no encontrado: {0}")]
    ProductNotFound(String),

    /// The product has no pricing/stock subentry for the project.
    #[error("No se encontró detalle de proyecto para el producto: {product_id}")]
    ProjectDetailNotFound { product_id: String },

    /// The conditional decrement found less stock than requested.
    #[error("Stock insuficiente para el producto: {product_id}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// No pending cart exists for the (customer, project) pair.
    #[error("No existe un carrito pendiente para este usuario y proyecto")]
    CartNotFound,

    /// The requested sale does not exist.
    #[error("Venta no encontrada: {project_id} nro {number}")]
    SaleNotFound { project_id: ProjectId, number: u64 },

    /// An attempt-journal append raced with another writer.
    #[error("Concurrency conflict for attempt {attempt_id}: expected seq {expected}, found {actual}")]
    ConcurrencyConflict {
        attempt_id: AttemptId,
        expected: i64,
        actual: i64,
    },

    /// The backing store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A payload failed domain validation.
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
