//! Marketplace users as seen by the ledger.

use common::UserId;
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// A registered user and their currency balance.
///
/// Credentials are owned by the authentication layer and are not modelled here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub balance: Money,
}
