//! Domain model for the multi-tenant marketplace backend.
//!
//! Products carry per-project pricing and stock subentries, carts are one
//! mutable pending aggregate per (customer, project), and sales are the
//! immutable numbered receipts produced by settlement. Validation of cart
//! payloads and sale totals lives here; storage does not.

mod cart;
mod error;
mod money;
mod product;
mod sale;

pub use cart::{Cart, CartItem, CartState, validate_cart_contents};
pub use error::DomainError;
pub use money::Money;
pub use product::{Product, ProjectDetail};
pub use sale::{PaymentType, Sale, SaleItem, SaleOrigin, SaleState, invoice_code};
