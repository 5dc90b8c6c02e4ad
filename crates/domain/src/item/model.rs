//! Item records.

use chrono::{DateTime, Utc};
use common::{CategoryId, ItemId, UserId};
use serde::{Deserialize, Serialize};

use super::ItemStatus;
use crate::error::DomainError;
use crate::money::Money;

/// An item listed on the marketplace.
///
/// `seller_id` is fixed at creation. `status` only changes through the
/// [`ItemStateMachine`](super::ItemStateMachine); timestamps are set by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub price: Money,
    pub description: String,
    pub category_id: CategoryId,
    pub seller_id: UserId,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Returns true if `user` listed this item.
    pub fn is_sold_by(&self, user: UserId) -> bool {
        self.seller_id == user
    }
}

/// The editable details of an item, used to create or update a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub name: String,
    pub price: Money,
    pub description: String,
    pub category_id: CategoryId,
}

impl ItemDraft {
    pub fn new(
        name: impl Into<String>,
        price: Money,
        description: impl Into<String>,
        category_id: CategoryId,
    ) -> Self {
        Self {
            name: name.into(),
            price,
            description: description.into(),
            category_id,
        }
    }

    /// Checks the draft's own fields. Category existence is checked by the
    /// listing service against the category store.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("item name must not be empty"));
        }
        if !self.price.is_positive() {
            return Err(DomainError::validation(format!(
                "price must be positive, got {}",
                self.price
            )));
        }
        Ok(())
    }
}
