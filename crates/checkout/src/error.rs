//! Checkout error types.
//!
//! Business-rule variants display the Spanish messages the storefront
//! shows; the API layer forwards them in `{"message"}` bodies.

use domain::DomainError;
use stores::StoreError;
use thiserror::Error;

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The caller has no project assignment in the directory.
    #[error("No autorizado: el usuario no tiene un proyecto asignado")]
    NoProjectAssigned,

    /// No pending cart exists for the customer and project.
    #[error("No existe un carrito pendiente para este usuario")]
    CartNotFound,

    /// The cart (or item list) has no items.
    #[error("El carrito está vacío")]
    EmptyCart,

    /// The declared total is non-positive or disagrees with the items.
    #[error("El total del carrito es inválido")]
    InvalidTotal,

    /// A referenced product does not exist.
    #[error("Producto no encontrado: {0}")]
    ProductNotFound(String),

    /// The product has no subentry for the caller's project.
    #[error("No se encontró detalle de proyecto para el producto: {0}")]
    ProjectDetailNotFound(String),

    /// A line item's quantity is zero or malformed.
    #[error("Stock o cantidad inválida para el producto: {0}")]
    InvalidQuantity(String),

    /// Not enough stock for a line item.
    #[error("Stock insuficiente para el producto: {0}")]
    InsufficientStock(String),

    /// The operator supplied an unknown sale state.
    #[error("Estado de venta inválido: {0}")]
    InvalidSaleState(String),

    /// Domain validation error.
    #[error(transparent)]
    Domain(DomainError),

    /// Store or journal fault not attributable to the request.
    #[error("Store error: {0}")]
    Store(StoreError),

    /// Directory lookup fault.
    #[error("Directory error: {0}")]
    Directory(String),

    /// Payment gateway fault.
    #[error("Payment gateway error: {0}")]
    Gateway(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for CheckoutError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ProductNotFound(id) => CheckoutError::ProductNotFound(id),
            StoreError::ProjectDetailNotFound { product_id } => {
                CheckoutError::ProjectDetailNotFound(product_id)
            }
            StoreError::InsufficientStock { product_id, .. } => {
                CheckoutError::InsufficientStock(product_id)
            }
            StoreError::CartNotFound => CheckoutError::CartNotFound,
            StoreError::Validation(d) => CheckoutError::Domain(d),
            other => CheckoutError::Store(other),
        }
    }
}

impl From<DomainError> for CheckoutError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::EmptyItems => CheckoutError::EmptyCart,
            DomainError::TotalMismatch | DomainError::InvalidTotal => CheckoutError::InvalidTotal,
            other => CheckoutError::Domain(other),
        }
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
