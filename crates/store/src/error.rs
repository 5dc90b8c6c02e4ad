use common::{ItemId, UserId};
use domain::{ItemStatus, Money};
use thiserror::Error;

/// Errors that can occur when interacting with a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A conditional status write found a different status than expected.
    #[error("Status conflict for item {item_id}: expected {expected}, found {actual}")]
    Conflict {
        item_id: ItemId,
        expected: ItemStatus,
        actual: ItemStatus,
    },

    /// Item details can no longer change in the item's current status.
    #[error("Item {item_id} cannot be edited while {status}")]
    NotEditable { item_id: ItemId, status: ItemStatus },

    /// The query cannot be expressed against the backing store.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A conditional debit found too little balance.
    #[error("Insufficient funds for user {user_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        user_id: UserId,
        balance: Money,
        requested: Money,
    },

    /// The store could not be reached or refused the call.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    pub fn item_not_found(id: ItemId) -> Self {
        Self::NotFound {
            entity: "Item",
            id: id.to_string(),
        }
    }

    pub fn user_not_found(id: UserId) -> Self {
        Self::NotFound {
            entity: "User",
            id: id.to_string(),
        }
    }

    pub fn category_not_found(id: common::CategoryId) -> Self {
        Self::NotFound {
            entity: "Category",
            id: id.to_string(),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
