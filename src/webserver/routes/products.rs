/// Product listing passthrough route
use axum::{extract::State, response::Response, routing::get, Router};
use std::sync::Arc;

use crate::webserver::{
    state::AppState,
    utils::{proxy_error_response, success_response},
};

/// Create product routes
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/bitget/products", get(products))
}

/// GET /api/bitget/products
async fn products(State(state): State<Arc<AppState>>) -> Response {
    match state.service.products().await {
        Ok(products) => success_response(products),
        Err(e) => proxy_error_response(&e),
    }
}
