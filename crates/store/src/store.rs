use async_trait::async_trait;
use common::{CategoryId, ItemId, UserId};
use domain::{Category, Item, ItemDraft, ItemStatus, Money, User};

use crate::{ItemQuery, Result};

/// Item records and their status.
///
/// Every method is a single-row atomic operation. All implementations must
/// be thread-safe (Send + Sync).
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Loads an item.
    ///
    /// Fails with `NotFound` if the item does not exist.
    async fn get_item(&self, id: ItemId) -> Result<Item>;

    /// Sets the item's status to `next` only if it is currently `expected`.
    ///
    /// Fails with `Conflict` (carrying the actual status) when the condition
    /// does not hold, so that two racing writers cannot both succeed.
    async fn conditional_set_status(
        &self,
        id: ItemId,
        expected: ItemStatus,
        next: ItemStatus,
    ) -> Result<()>;

    /// Sets the item's status unconditionally.
    ///
    /// Only used to compensate a failed purchase.
    async fn set_status(&self, id: ItemId, next: ItemStatus) -> Result<()>;

    /// Creates an item in `Initial` status.
    async fn insert_item(&self, seller_id: UserId, draft: ItemDraft) -> Result<Item>;

    /// Replaces an item's editable details. Never touches the status or seller.
    ///
    /// The write applies only while the item is not `SoldOut`; otherwise it
    /// fails with `NotEditable`.
    async fn update_item(&self, id: ItemId, draft: ItemDraft) -> Result<Item>;

    /// Lists items matching a query, most recently updated first.
    async fn query_items(&self, query: ItemQuery) -> Result<Vec<Item>>;
}

/// Per-user balances.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Loads a user.
    ///
    /// Fails with `NotFound` if the user does not exist.
    async fn get_user(&self, id: UserId) -> Result<User>;

    /// Registers a user with a zero balance.
    async fn create_user(&self, name: &str) -> Result<User>;

    /// Atomically adds `delta` (which may be negative) to the balance.
    ///
    /// Does not enforce non-negativity. Returns the new balance.
    async fn add_balance(&self, id: UserId, delta: Money) -> Result<Money>;

    /// Atomically debits `amount` only if the balance covers it.
    ///
    /// Fails with `InsufficientFunds` otherwise. Returns the new balance.
    async fn withdraw(&self, id: UserId, amount: Money) -> Result<Money>;
}

/// Read-only category reference data.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Loads a category.
    ///
    /// Fails with `NotFound` if the category does not exist.
    async fn get_category(&self, id: CategoryId) -> Result<Category>;

    /// Lists all categories ordered by ID.
    async fn list_categories(&self) -> Result<Vec<Category>>;
}

/// A single backend implementing every store contract.
///
/// Blanket-implemented; lets callers name one type parameter for the whole
/// marketplace backend.
pub trait MarketStore: ItemStore + LedgerStore + CategoryStore + Clone + 'static {}

impl<T> MarketStore for T where T: ItemStore + LedgerStore + CategoryStore + Clone + 'static {}
