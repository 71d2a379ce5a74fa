//! Domain error types.
//!
//! Business-rule violations carry the Spanish user-facing messages the
//! storefront displays; the API layer forwards them verbatim.

use thiserror::Error;

/// Errors raised by domain validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A cart item is missing its product id.
    #[error("Cada producto debe tener un producto_id válido")]
    MissingProductId,

    /// A cart item quantity is below the minimum of one unit.
    #[error("Cantidad inválida para el producto: {product_id}")]
    InvalidQuantity { product_id: String },

    /// A cart item price is below one cent.
    #[error("Precio inválido para el producto: {product_id}")]
    InvalidPrice { product_id: String },

    /// The cart total is negative.
    #[error("El total del carrito es inválido")]
    InvalidTotal,

    /// The declared total disagrees with the sum of line items.
    #[error("El total no coincide con los productos del carrito")]
    TotalMismatch,

    /// An item list was empty where at least one item is required.
    #[error("El carrito está vacío")]
    EmptyItems,
}
