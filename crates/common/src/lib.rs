//! Shared identifier types used across the marketplace backend.

mod types;

pub use types::{AttemptId, ClientId, ProjectId};
