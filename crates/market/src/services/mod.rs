//! Marketplace services around the purchase saga.

pub mod listing;
pub mod wallet;

pub use listing::{ItemDetails, ListingService, Page};
pub use wallet::WalletService;
