//! Sell and purchase endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::Transition;
use market::Receipt;
use serde::Deserialize;
use store::MarketStore;

use super::parse_item_id;
use crate::AppState;
use crate::auth::Actor;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct SellRequest {
    pub item_id: String,
}

/// POST /sell: put one of the actor's items on sale.
#[tracing::instrument(skip(state, req))]
pub async fn sell<S: MarketStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Json(req): Json<SellRequest>,
) -> Result<Json<Transition>, ApiError> {
    let item_id = parse_item_id(&req.item_id)?;
    let transition = state.orchestrator.sell(actor, item_id).await?;
    Ok(Json(transition))
}

/// POST /purchase/{item_id}: buy an item on sale.
///
/// The saga runs to the end even if the client disconnects.
#[tracing::instrument(skip(state))]
pub async fn purchase<S: MarketStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Path(id): Path<String>,
) -> Result<Json<Receipt>, ApiError> {
    let item_id = parse_item_id(&id)?;
    let receipt = state
        .orchestrator
        .purchase_to_completion(actor, item_id)
        .await?;
    Ok(Json(receipt))
}
