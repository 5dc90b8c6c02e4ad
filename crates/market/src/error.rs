//! Marketplace error types.

use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Errors returned by the orchestrator and marketplace services.
///
/// Every variant maps to one stable [`kind`](MarketError::kind) label used by
/// logs, metrics and the HTTP layer.
#[derive(Debug, Error)]
pub enum MarketError {
    /// An item, user or category does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The actor is not entitled to perform the action.
    #[error("{0}")]
    Forbidden(String),

    /// The item's status does not permit the requested transition.
    #[error("{0}")]
    InvalidState(String),

    /// Lost a race on the conditional item status write.
    #[error("{0}")]
    Conflict(String),

    /// The buyer's balance is below the price.
    #[error("{0}")]
    InsufficientFunds(String),

    /// Listing or wallet input failed validation.
    #[error("{0}")]
    Validation(String),

    /// A store call failed or timed out.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A compensating write failed after an earlier step failed.
    ///
    /// Balances or the item status may now be inconsistent and need manual
    /// reconciliation.
    #[error("Compensation failed after '{original}': {compensation}")]
    CompensationFailed {
        original: Box<MarketError>,
        compensation: Box<MarketError>,
    },
}

impl MarketError {
    /// Stable snake_case label for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::InvalidState(_) => "invalid_state",
            Self::Conflict(_) => "conflict",
            Self::InsufficientFunds(_) => "insufficient_funds",
            Self::Validation(_) => "validation",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::CompensationFailed { .. } => "compensation_failed",
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_compensation_failure(&self) -> bool {
        matches!(self, Self::CompensationFailed { .. })
    }
}

impl From<DomainError> for MarketError {
    fn from(err: DomainError) -> Self {
        let msg = err.to_string();
        match err {
            DomainError::Forbidden { .. } => Self::Forbidden(msg),
            DomainError::InvalidState { .. } => Self::InvalidState(msg),
            DomainError::InsufficientFunds { .. } => Self::InsufficientFunds(msg),
            DomainError::Validation(_) => Self::Validation(msg),
        }
    }
}

impl From<StoreError> for MarketError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::Conflict { .. } => Self::Conflict(err.to_string()),
            StoreError::NotEditable { .. } => Self::InvalidState(err.to_string()),
            StoreError::InvalidQuery(_) => Self::Validation(err.to_string()),
            StoreError::InsufficientFunds { .. } => Self::InsufficientFunds(err.to_string()),
            StoreError::Unavailable(_) | StoreError::Database(_) | StoreError::Migration(_) => {
                Self::StoreUnavailable(err.to_string())
            }
        }
    }
}

/// Convenience type alias for marketplace results.
pub type Result<T> = std::result::Result<T, MarketError>;
