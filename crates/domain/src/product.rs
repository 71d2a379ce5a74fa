//! Product catalog model.

use common::ProjectId;
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Per-project pricing and stock subentry attached to a shared product.
///
/// `stock` is the single authoritative on-hand quantity for the project.
/// Wholesale pricing is a tier (`wholesale_price`), not a second counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDetail {
    /// The owning project.
    pub project_id: ProjectId,

    /// Purchase (cost) price, non-negative.
    pub purchase_price: Money,

    /// Retail sale price, non-negative.
    pub sale_price: Money,

    /// Optional wholesale-tier price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wholesale_price: Option<Money>,

    /// Reference to the project's measurement unit record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// On-hand quantity, never negative.
    pub stock: i64,
}

/// A catalog product shared across projects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Brand name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    /// Reference to the stored product image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Category references; admins must assign at least one.
    pub category_ids: Vec<String>,

    /// Per-project pricing/stock subentries, in admin-defined order.
    pub project_details: Vec<ProjectDetail>,
}

impl Product {
    /// Returns the project detail for the given project, if any.
    pub fn project_detail(&self, project_id: &ProjectId) -> Option<&ProjectDetail> {
        self.project_details
            .iter()
            .find(|d| &d.project_id == project_id)
    }

    /// Mutable variant of [`Product::project_detail`].
    pub fn project_detail_mut(&mut self, project_id: &ProjectId) -> Option<&mut ProjectDetail> {
        self.project_details
            .iter_mut()
            .find(|d| &d.project_id == project_id)
    }
}
