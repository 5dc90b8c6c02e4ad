//! Item listing and browsing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::CategoryId;
use domain::{Category, Item, ItemDraft, Money};
use market::{ItemDetails, Page};
use serde::Deserialize;
use store::MarketStore;

use super::{parse_item_id, parse_user_id};
use crate::AppState;
use crate::auth::Actor;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct ItemRequest {
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub description: String,
    pub category_id: i64,
}

impl From<ItemRequest> for ItemDraft {
    fn from(req: ItemRequest) -> Self {
        ItemDraft::new(
            req.name,
            Money::new(req.price),
            req.description,
            CategoryId::new(req.category_id),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub name: String,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

// -- Handlers --

/// GET /categories
pub async fn categories<S: MarketStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.listings.categories().await?))
}

/// GET /items: items currently on sale.
#[tracing::instrument(skip(state))]
pub async fn on_sale<S: MarketStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Item>>, ApiError> {
    Ok(Json(state.listings.on_sale_items(page).await?))
}

/// POST /items: list a new item owned by the actor.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: MarketStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Json(req): Json<ItemRequest>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let item = state.listings.create_item(actor, req.into()).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /items/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: MarketStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ItemDetails>, ApiError> {
    let item_id = parse_item_id(&id)?;
    Ok(Json(state.listings.get_item(item_id).await?))
}

/// PUT /items/{id}: edit one of the actor's unsold items.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: MarketStore>(
    State(state): State<Arc<AppState<S>>>,
    Actor(actor): Actor,
    Path(id): Path<String>,
    Json(req): Json<ItemRequest>,
) -> Result<Json<Item>, ApiError> {
    let item_id = parse_item_id(&id)?;
    let item = state
        .listings
        .update_item(actor, item_id, req.into())
        .await?;
    Ok(Json(item))
}

/// GET /users/{id}/items: everything a user has listed.
#[tracing::instrument(skip(state))]
pub async fn by_seller<S: MarketStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Query(page): Query<Page>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let seller_id = parse_user_id(&id)?;
    Ok(Json(state.listings.items_by_seller(seller_id, page).await?))
}

/// GET /search?name=
#[tracing::instrument(skip(state))]
pub async fn search<S: MarketStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let page = Page {
        limit: params.limit,
        offset: params.offset,
    };
    Ok(Json(state.listings.search(&params.name, page).await?))
}
