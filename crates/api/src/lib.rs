//! HTTP API server for the marketplace backend.
//!
//! Provides REST endpoints for users, listings and purchases, with
//! structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use market::{ListingService, OrchestratorConfig, PurchaseOrchestrator, WalletService};
use metrics_exporter_prometheus::PrometheusHandle;
use store::MarketStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: MarketStore> {
    pub orchestrator: PurchaseOrchestrator<S, S>,
    pub listings: ListingService<S>,
    pub wallet: WalletService<S>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: MarketStore>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/users", post(routes::users::register::<S>))
        .route(
            "/balance",
            get(routes::users::balance::<S>).post(routes::users::top_up::<S>),
        )
        .route("/categories", get(routes::items::categories::<S>))
        .route(
            "/items",
            get(routes::items::on_sale::<S>).post(routes::items::create::<S>),
        )
        .route(
            "/items/{id}",
            get(routes::items::get::<S>).put(routes::items::update::<S>),
        )
        .route("/users/{id}/items", get(routes::items::by_seller::<S>))
        .route("/search", get(routes::items::search::<S>))
        .route("/sell", post(routes::trade::sell::<S>))
        .route("/purchase/{item_id}", post(routes::trade::purchase::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state with every service backed by `store`.
pub fn create_default_state<S: MarketStore>(
    store: S,
    config: OrchestratorConfig,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        orchestrator: PurchaseOrchestrator::with_config(store.clone(), store.clone(), config),
        listings: ListingService::new(store.clone()),
        wallet: WalletService::new(store),
    })
}
