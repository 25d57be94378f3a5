use axum::{
    routing::{get, post},
    Router,
};

use crate::api::handlers::{self, BackendState, GatewayState};

/// Routes served by a backend record service
pub fn create_backend_router() -> Router<BackendState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/rpc/:entity/get", post(handlers::get_record))
        .route("/rpc/:entity/upsert", post(handlers::upsert_record))
}

/// Routes served by the GraphQL-facing gateway
pub fn create_gateway_router() -> Router<GatewayState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/graphql", post(handlers::graphql))
        .route("/update_product/", post(handlers::update_products))
}
