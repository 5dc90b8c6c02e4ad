//! Domain layer for the marketplace backend.
//!
//! This crate holds the pure parts of the purchase workflow:
//! - the data model (items, users, categories, money)
//! - the item status state machine (`Initial → OnSale → SoldOut`)
//! - the shared validation error type
//!
//! Nothing in here performs I/O; stores and orchestration live in other crates.

pub mod category;
pub mod error;
pub mod item;
pub mod money;
pub mod user;

pub use category::Category;
pub use common::{CategoryId, ItemId, UserId};
pub use error::DomainError;
pub use item::{Item, ItemDraft, ItemStateMachine, ItemStatus, Transition};
pub use money::Money;
pub use user::User;
