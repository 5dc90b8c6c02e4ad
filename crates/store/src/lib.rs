//! Persistence collaborators for the marketplace.
//!
//! Each store offers only single-row atomic operations. Cross-row consistency
//! (moving money while changing an item's status) is the orchestrator's job.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{DEFAULT_CATEGORIES, InMemoryMarketStore, StoreOp};
pub use postgres::PostgresMarketStore;
pub use query::ItemQuery;
pub use store::{CategoryStore, ItemStore, LedgerStore, MarketStore};
