//! User registration and balances.

use common::UserId;
use domain::{Money, User};
use store::LedgerStore;

use crate::error::{MarketError, Result};

/// Ledger operations that are not part of a purchase.
#[derive(Clone)]
pub struct WalletService<L: LedgerStore> {
    ledger: L,
}

impl<L: LedgerStore> WalletService<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Registers a user with a zero balance.
    #[tracing::instrument(skip(self))]
    pub async fn register(&self, name: &str) -> Result<User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MarketError::validation("user name must not be empty"));
        }
        let user = self.ledger.create_user(name).await?;
        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    pub async fn balance(&self, user_id: UserId) -> Result<Money> {
        Ok(self.ledger.get_user(user_id).await?.balance)
    }

    /// Adds a positive amount to the balance. Returns the new balance.
    #[tracing::instrument(skip(self))]
    pub async fn top_up(&self, user_id: UserId, amount: Money) -> Result<Money> {
        if !amount.is_positive() {
            return Err(MarketError::validation(format!(
                "top-up amount must be positive, got {amount}"
            )));
        }
        Ok(self.ledger.add_balance(user_id, amount).await?)
    }
}
