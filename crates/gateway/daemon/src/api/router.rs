//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    let routes = Router::new()
        // Health
        .route("/health", get(handlers::health_check))
        // Channels
        .route(
            "/channels",
            get(handlers::list_channels).post(handlers::create_channel),
        )
        .route("/channels/:channel", get(handlers::query_chain_info))
        .route("/channels/:channel/peers", post(handlers::join_channel))
        .route(
            "/channels/:channel/blocks/:number",
            get(handlers::query_block),
        )
        .route(
            "/channels/:channel/transactions/:tx_id",
            get(handlers::query_transaction),
        )
        // Chaincodes
        .route(
            "/chaincodes",
            get(handlers::list_chaincodes).post(handlers::install_chaincode),
        )
        .route(
            "/channels/:channel/chaincodes",
            post(handlers::instantiate_chaincode),
        )
        .route(
            "/channels/:channel/chaincodes/:chaincode",
            get(handlers::query_chaincode).post(handlers::invoke_chaincode),
        )
        .layer(TraceLayer::new_for_http());

    let routes = if enable_cors {
        routes.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        routes
    };

    routes.with_state(state)
}
