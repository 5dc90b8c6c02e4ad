//! Registration and wallet endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::UserId;
use domain::{Money, User};
use serde::{Deserialize, Serialize};
use store::MarketStore;

use crate::AppState;
use crate::auth::Actor;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct TopUpRequest {
    pub amount: i64,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub user_id: UserId,
    pub balance: Money,
}

/// POST /users: register a user with a zero balance.
#[tracing::instrument(skip(state, req))]
pub async fn register<S: MarketStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.wallet.register(&req.name).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /balance: the actor's balance.
#[tracing::instrument(skip(state))]
pub async fn balance<S: MarketStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.wallet.balance(actor).await?;
    Ok(Json(BalanceResponse {
        user_id: actor,
        balance,
    }))
}

/// POST /balance: top up the actor's balance.
#[tracing::instrument(skip(state, req))]
pub async fn top_up<S: MarketStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Json(req): Json<TopUpRequest>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.wallet.top_up(actor, Money::new(req.amount)).await?;
    Ok(Json(BalanceResponse {
        user_id: actor,
        balance,
    }))
}
