//! Sale (venta) model: the immutable, numbered receipt of a settlement.

use chrono::{DateTime, Utc};
use common::{ClientId, ProjectId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::money::Money;

/// Fulfillment state of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaleState {
    /// Created but not yet paid (in-store credit flows).
    Pending,
    /// Payment received.
    Paid,
    /// Paid and awaiting handoff; the default for web checkouts.
    ReadyForDelivery,
    /// Handed to the customer.
    Delivered,
    /// Cancelled by an operator.
    Cancelled,
    /// Settlement could not complete; stock was restored.
    Failed,
}

impl SaleState {
    /// Returns the state name as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleState::Pending => "pendiente",
            SaleState::Paid => "pagado",
            SaleState::ReadyForDelivery => "para entrega",
            SaleState::Delivered => "entregado",
            SaleState::Cancelled => "cancelado",
            SaleState::Failed => "fallido",
        }
    }

    /// Parses a wire state name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pendiente" => Some(SaleState::Pending),
            "pagado" => Some(SaleState::Paid),
            "para entrega" => Some(SaleState::ReadyForDelivery),
            "entregado" => Some(SaleState::Delivered),
            "cancelado" => Some(SaleState::Cancelled),
            "fallido" => Some(SaleState::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for SaleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Channel that produced a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleOrigin {
    /// Customer self-checkout.
    Web,
    /// Staff-entered at the counter.
    #[serde(rename = "tienda")]
    InStore,
}

impl SaleOrigin {
    /// Returns the origin name as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleOrigin::Web => "web",
            SaleOrigin::InStore => "tienda",
        }
    }
}

impl std::fmt::Display for SaleOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment channel tag recorded on the sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentType(String);

impl PaymentType {
    /// Creates a payment-type tag from the wire value.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The default gateway tag for web checkouts.
    pub fn gateway() -> Self {
        Self("mercadopago".to_string())
    }

    /// Returns the tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A snapshot line item on a sale; prices are frozen at settlement time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    /// The product sold.
    pub product_id: String,

    /// Unit price snapshot.
    pub unit_price: Money,

    /// Units sold.
    pub quantity: u32,
}

impl SaleItem {
    /// The line total (`unit_price * quantity`).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Builds the human-facing invoice code for a sale: `T<project>-<number>`.
pub fn invoice_code(project_id: &ProjectId, number: u64) -> String {
    format!("T{}-{}", project_id, number)
}

/// An immutable committed sale, numbered per project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    /// Per-project sequential number (monotonic, gap-tolerant).
    pub number: u64,

    /// Invoice code derived from project and number.
    pub invoice_code: String,

    /// Relational client id, when the directory resolved one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientId>,

    /// Customer email, when the sale came from a web checkout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Snapshot line items.
    pub items: Vec<SaleItem>,

    /// Total charged; always equals the sum of line totals.
    pub total: Money,

    /// Owning project.
    pub project_id: ProjectId,

    /// Fulfillment state.
    pub state: SaleState,

    /// Payment channel tag.
    pub payment_type: PaymentType,

    /// Channel that produced the sale.
    pub origin: SaleOrigin,

    /// When the sale was committed.
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Sum of line totals over the sale's items.
    pub fn computed_total(&self) -> Money {
        self.items.iter().map(SaleItem::line_total).sum()
    }

    /// Checks the sale-total invariant: at least one item and a total
    /// equal to the sum of `unit_price * quantity`.
    pub fn check_total(&self) -> Result<(), DomainError> {
        if self.items.is_empty() {
            return Err(DomainError::EmptyItems);
        }
        if self.computed_total() != self.total {
            return Err(DomainError::TotalMismatch);
        }
        Ok(())
    }
}
