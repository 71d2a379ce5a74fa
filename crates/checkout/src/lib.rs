//! Checkout and inventory-settlement workflow.
//!
//! This crate coordinates the multi-store settlement a checkout
//! performs, with compensating actions on failure.
//!
//! A settlement attempt runs three journaled steps:
//! 1. Persist the sale under the project's next sale number
//! 2. Conditionally decrement stock per line item
//! 3. Clear the pending cart that sourced the sale
//!
//! If a step fails, previously applied effects are undone in reverse
//! order and the attempt ends failed.

pub mod aggregate;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod services;
pub mod settlement;
pub mod state;

pub use aggregate::CheckoutAttempt;
pub use coordinator::{AdminSaleRequest, CheckoutCoordinator, SettlementOutcome, SettlementRequest};
pub use error::CheckoutError;
pub use events::AttemptEvent;
pub use services::{
    Directory, InMemoryDirectory, InMemoryPaymentGateway, PaymentGateway, PaymentIntent,
    PostgresDirectory,
};
pub use state::AttemptState;
