//! Purchase saga step names.
//!
//! Used as structured `step` fields in logs and as compensation labels.

/// The saga type identifier for purchases.
pub const SAGA_TYPE: &str = "Purchase";

/// Step name: Load the item being bought.
pub const STEP_LOAD_ITEM: &str = "load_item";

/// Step name: Load the buyer's ledger entry.
pub const STEP_LOAD_BUYER: &str = "load_buyer";

/// Step name: Check status, ownership and funds.
pub const STEP_VALIDATE: &str = "validate";

/// Step name: Conditionally mark the item `SoldOut`. First mutation.
pub const STEP_MARK_SOLD_OUT: &str = "mark_sold_out";

/// Step name: Debit the buyer.
pub const STEP_DEBIT_BUYER: &str = "debit_buyer";

/// Step name: Load the seller's ledger entry.
pub const STEP_LOAD_SELLER: &str = "load_seller";

/// Step name: Credit the seller.
pub const STEP_CREDIT_SELLER: &str = "credit_seller";

/// Compensation name: Put the item back on sale.
pub const COMPENSATE_REVERT_ITEM: &str = "revert_item";

/// Compensation name: Give the buyer their money back.
pub const COMPENSATE_REFUND_BUYER: &str = "refund_buyer";

/// Step name: Conditionally mark the item `OnSale`. The whole sell operation.
pub const STEP_MARK_ON_SALE: &str = "mark_on_sale";
