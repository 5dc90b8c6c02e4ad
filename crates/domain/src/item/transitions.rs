//! Legal item status transitions.

use common::{ItemId, UserId};
use serde::{Deserialize, Serialize};

use super::{Item, ItemStatus};
use crate::error::DomainError;
use crate::money::Money;

/// A status write requested by the state machine.
///
/// `from` is the status the decision was made against; stores use it as the
/// expected value of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub item_id: ItemId,
    pub from: ItemStatus,
    pub to: ItemStatus,
}

/// Decides which status transitions are legal.
///
/// The decisions are made over the snapshot handed in by the caller. Nothing
/// here guarantees the snapshot is still current; that is the job of the
/// conditional write at the item store.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemStateMachine;

impl ItemStateMachine {
    /// `Initial → OnSale`, only by the item's seller.
    pub fn sell(actor: UserId, item: &Item) -> Result<Transition, DomainError> {
        if !item.is_sold_by(actor) {
            return Err(DomainError::Forbidden {
                actor,
                item_id: item.id,
                action: "sell",
            });
        }
        if !item.status.can_sell() {
            return Err(DomainError::InvalidState {
                item_id: item.id,
                current: item.status,
                action: "sell",
            });
        }
        Ok(Transition {
            item_id: item.id,
            from: ItemStatus::Initial,
            to: ItemStatus::OnSale,
        })
    }

    /// `OnSale → SoldOut`, only by someone other than the seller who can
    /// afford the price.
    pub fn purchase(
        actor: UserId,
        item: &Item,
        buyer_balance: Money,
    ) -> Result<Transition, DomainError> {
        if !item.status.can_purchase() {
            return Err(DomainError::InvalidState {
                item_id: item.id,
                current: item.status,
                action: "purchase",
            });
        }
        if item.is_sold_by(actor) {
            return Err(DomainError::Forbidden {
                actor,
                item_id: item.id,
                action: "purchase",
            });
        }
        if buyer_balance < item.price {
            return Err(DomainError::InsufficientFunds {
                balance: buyer_balance,
                price: item.price,
            });
        }
        Ok(Transition {
            item_id: item.id,
            from: ItemStatus::OnSale,
            to: ItemStatus::SoldOut,
        })
    }

    /// `SoldOut → OnSale`, the compensation for a purchase that failed after
    /// the item was marked sold. Unconditional.
    pub fn revert(item_id: ItemId) -> Transition {
        Transition {
            item_id,
            from: ItemStatus::SoldOut,
            to: ItemStatus::OnSale,
        }
    }
}
