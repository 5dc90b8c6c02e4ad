//! Purchase orchestration for the marketplace.
//!
//! A purchase touches two stores that cannot share a transaction, so it runs
//! as a saga:
//! 1. Load the item and the buyer, then validate
//! 2. Conditionally mark the item `SoldOut`
//! 3. Debit the buyer
//! 4. Load and credit the seller
//!
//! If a step after the first write fails, the committed steps are compensated
//! in reverse order.

pub mod compensation;
pub mod coordinator;
pub mod error;
pub mod services;
pub mod steps;

pub use compensation::{Compensation, CompensationLog};
pub use coordinator::{DEFAULT_STORE_TIMEOUT, OrchestratorConfig, PurchaseOrchestrator, Receipt};
pub use error::{MarketError, Result};
pub use services::{ItemDetails, ListingService, Page, WalletService};
