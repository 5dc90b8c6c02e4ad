//! Item status state machine states.

use serde::{Deserialize, Serialize};

/// The status of an item in its lifecycle.
///
/// State transitions:
/// ```text
/// Initial ──sell──► OnSale ──purchase──► SoldOut
///                     ▲                     │
///                     └──────revert─────────┘
/// ```
///
/// `revert` is only ever issued as a compensation step of a failed purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ItemStatus {
    /// Listed by its seller but not yet offered for sale.
    #[default]
    Initial,

    /// Offered for sale; may be purchased by anyone but the seller.
    OnSale,

    /// Purchased.
    SoldOut,
}

impl ItemStatus {
    /// Returns true if the item can be put on sale from this status.
    pub fn can_sell(&self) -> bool {
        matches!(self, ItemStatus::Initial)
    }

    /// Returns true if the item can be purchased in this status.
    pub fn can_purchase(&self) -> bool {
        matches!(self, ItemStatus::OnSale)
    }

    /// Returns true if the item's details may still be edited.
    pub fn can_edit(&self) -> bool {
        !matches!(self, ItemStatus::SoldOut)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Initial => "Initial",
            ItemStatus::OnSale => "OnSale",
            ItemStatus::SoldOut => "SoldOut",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown status name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown item status: {0}")]
pub struct UnknownStatus(pub String);

impl std::str::FromStr for ItemStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Initial" => Ok(ItemStatus::Initial),
            "OnSale" => Ok(ItemStatus::OnSale),
            "SoldOut" => Ok(ItemStatus::SoldOut),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_initial() {
        assert_eq!(ItemStatus::default(), ItemStatus::Initial);
    }

    #[test]
    fn test_only_initial_can_sell() {
        assert!(ItemStatus::Initial.can_sell());
        assert!(!ItemStatus::OnSale.can_sell());
        assert!(!ItemStatus::SoldOut.can_sell());
    }

    #[test]
    fn test_only_on_sale_can_purchase() {
        assert!(!ItemStatus::Initial.can_purchase());
        assert!(ItemStatus::OnSale.can_purchase());
        assert!(!ItemStatus::SoldOut.can_purchase());
    }

    #[test]
    fn test_sold_out_is_frozen() {
        assert!(ItemStatus::Initial.can_edit());
        assert!(ItemStatus::OnSale.can_edit());
        assert!(!ItemStatus::SoldOut.can_edit());
    }

    #[test]
    fn test_display_and_parse() {
        for status in [ItemStatus::Initial, ItemStatus::OnSale, ItemStatus::SoldOut] {
            let parsed: ItemStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert_eq!(
            "Shipped".parse::<ItemStatus>(),
            Err(UnknownStatus("Shipped".to_string()))
        );
    }
}
