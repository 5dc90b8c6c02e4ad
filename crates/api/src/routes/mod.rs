//! HTTP route handlers.

pub mod items;
pub mod system;
pub mod trade;
pub mod users;

use common::{ItemId, UserId};

use crate::error::ApiError;

fn parse_item_id(id: &str) -> Result<ItemId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid item ID: {e}")))
}

fn parse_user_id(id: &str) -> Result<UserId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid user ID: {e}")))
}
