//! Settlement workflow constants.

/// The workflow type identifier journaled with each attempt.
pub const WORKFLOW_TYPE: &str = "CheckoutSettlement";

/// Step name: allocate the sale number and write the sale record.
pub const STEP_PERSIST_SALE: &str = "persist_sale";

/// Step name: apply the conditional stock decrement per line item.
pub const STEP_DECREMENT_STOCK: &str = "decrement_stock";

/// Step name: delete the pending cart that sourced the sale.
pub const STEP_CLEAR_CART: &str = "clear_cart";
