//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use market::MarketError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// No usable actor on the request.
    Unauthorized(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Error from the marketplace services.
    Market(MarketError),
}

impl ApiError {
    /// Stable label returned as the `kind` field of error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Market(err) => err.kind(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Market(err) => market_error_status(err),
        }
    }
}

fn market_error_status(err: &MarketError) -> StatusCode {
    match err {
        MarketError::NotFound { .. } => StatusCode::NOT_FOUND,
        MarketError::Forbidden(_) => StatusCode::FORBIDDEN,
        MarketError::InvalidState(_) | MarketError::Conflict(_) => StatusCode::CONFLICT,
        MarketError::InsufficientFunds(_) => StatusCode::PRECONDITION_FAILED,
        MarketError::Validation(_) => StatusCode::BAD_REQUEST,
        MarketError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        MarketError::CompensationFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();
        let message = match self {
            ApiError::Unauthorized(msg) | ApiError::BadRequest(msg) => msg,
            ApiError::Market(err) => {
                if err.is_compensation_failure() {
                    tracing::error!(error = %err, "purchase needs manual reconciliation");
                } else if status.is_server_error() {
                    tracing::warn!(error = %err, kind, "request failed");
                }
                err.to_string()
            }
        };

        metrics::counter!("api_errors_total", "kind" => kind).increment(1);

        let body = serde_json::json!({ "error": message, "kind": kind });
        (status, axum::Json(body)).into_response()
    }
}

impl From<MarketError> for ApiError {
    fn from(err: MarketError) -> Self {
        ApiError::Market(err)
    }
}
