//! Store adapters for the marketplace backend.
//!
//! Each store exposes an async trait plus an in-memory implementation;
//! the checkout attempt journal additionally ships a PostgreSQL
//! implementation. The catalog's conditional stock decrement and the
//! sale store's per-project sequence are the two operations that must be
//! atomic; everything the settlement workflow's correctness leans on
//! lives behind these traits.

mod attempt;
mod cart;
mod catalog;
mod error;
mod postgres;
mod sale;

pub use attempt::{AttemptLog, AttemptRecord, InMemoryAttemptLog};
pub use cart::{CartStore, InMemoryCartStore};
pub use catalog::{CatalogStore, InMemoryCatalogStore};
pub use error::{Result, StoreError};
pub use postgres::PostgresAttemptLog;
pub use sale::{InMemorySaleStore, SaleStore};
