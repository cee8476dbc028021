use axum::{Router, http::Uri, routing::get};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::db::{Session, SqlitePool};
use crate::error::{GatewayError, GatewayResult};
use crate::handlers::api::api_handler;

/// Mount point of the API; everything below it is handed to the dispatcher.
pub const API_PREFIX: &str = "/api";

#[derive(Clone)]
pub struct GatewayState {
    pub pool: SqlitePool,
    pub settings: Arc<GatewayConfig>,
}

impl GatewayState {
    pub fn new(pool: SqlitePool, settings: GatewayConfig) -> Self {
        Self {
            pool,
            settings: Arc::new(settings),
        }
    }

    /// Check out a connection for one request.
    pub async fn session(&self) -> GatewayResult<Session> {
        Session::begin(&self.pool, self.settings.query_timeout()).await
    }
}

pub fn gateway_router(state: GatewayState) -> Router {
    Router::new()
        .route(&format!("{API_PREFIX}/{{*path}}"), get(api_handler))
        .fallback(unknown_method)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn unknown_method(uri: Uri) -> GatewayError {
    GatewayError::MethodNotFound(uri.path().to_string())
}
