//! Cart aggregate model and payload validation.

use common::ProjectId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::money::Money;

/// Lifecycle state of a cart.
///
/// Exactly one `Pending` cart exists per (customer, project); settlement
/// deletes it, so `Paid`/`Cancelled` only appear transiently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CartState {
    /// Open order-in-progress.
    #[default]
    Pending,
    /// Converted to a sale.
    Paid,
    /// Abandoned by the customer.
    Cancelled,
}

impl CartState {
    /// Returns the state name as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            CartState::Pending => "pendiente",
            CartState::Paid => "pagado",
            CartState::Cancelled => "cancelado",
        }
    }
}

impl std::fmt::Display for CartState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A line item inside a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// The product being purchased.
    pub product_id: String,

    /// Units requested, at least one.
    pub quantity: u32,

    /// Unit price at the time the item was added, at least one cent.
    pub unit_price: Money,

    /// Display name carried for the storefront.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CartItem {
    /// The line total (`unit_price * quantity`).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// The single mutable order-in-progress for a (customer, project) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    /// Customer email; the cart key, not a surrogate id.
    pub customer_email: String,

    /// Owning project.
    pub project_id: ProjectId,

    /// Ordered line items.
    pub items: Vec<CartItem>,

    /// Declared total; callers must keep it equal to the item sum.
    pub total: Money,

    /// Lifecycle state.
    pub state: CartState,
}

impl Cart {
    /// Creates an empty pending cart.
    pub fn empty(customer_email: impl Into<String>, project_id: ProjectId) -> Self {
        Self {
            customer_email: customer_email.into(),
            project_id,
            items: Vec::new(),
            total: Money::zero(),
            state: CartState::Pending,
        }
    }

    /// Sum of line totals over the current items.
    pub fn computed_total(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }
}

/// Validates a replacement payload for a cart.
///
/// Every item needs a product id, a quantity of at least one unit and a
/// unit price of at least one cent; the total must be non-negative. The
/// caller's stored cart is untouched when this fails.
pub fn validate_cart_contents(items: &[CartItem], total: Money) -> Result<(), DomainError> {
    if total.is_negative() {
        return Err(DomainError::InvalidTotal);
    }
    for item in items {
        if item.product_id.trim().is_empty() {
            return Err(DomainError::MissingProductId);
        }
        if item.quantity == 0 {
            return Err(DomainError::InvalidQuantity {
                product_id: item.product_id.clone(),
            });
        }
        if item.unit_price.cents() < 1 {
            return Err(DomainError::InvalidPrice {
                product_id: item.product_id.clone(),
            });
        }
    }
    Ok(())
}
