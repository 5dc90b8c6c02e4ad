//! Domain error types.

use common::{ItemId, UserId};
use thiserror::Error;

use crate::item::ItemStatus;
use crate::money::Money;

/// Errors raised by the item state machine and draft validation.
///
/// These are pure decisions over a caller-supplied snapshot: returning one
/// of them never implies that anything was written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The actor is not entitled to perform the action on this item.
    #[error("User {actor} may not {action} item {item_id}")]
    Forbidden {
        actor: UserId,
        item_id: ItemId,
        action: &'static str,
    },

    /// The item's status does not permit the requested transition.
    #[error("Cannot {action} item {item_id} while it is {current}")]
    InvalidState {
        item_id: ItemId,
        current: ItemStatus,
        action: &'static str,
    },

    /// The buyer cannot afford the item.
    #[error("Insufficient funds: balance {balance}, price {price}")]
    InsufficientFunds { balance: Money, price: Money },

    /// Input failed validation.
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
