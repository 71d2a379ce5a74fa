//! External collaborators consumed by the checkout workflow.

pub mod directory;
pub mod payment;

pub use directory::{Directory, InMemoryDirectory, PostgresDirectory};
pub use payment::{InMemoryPaymentGateway, PaymentGateway, PaymentIntent};
