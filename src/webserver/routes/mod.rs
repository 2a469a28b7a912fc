use crate::webserver::state::AppState;
use axum::Router;
use std::sync::Arc;

pub mod alerts;
pub mod candles;
pub mod products;
pub mod status;
pub mod tickers;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new().nest("/api", api_routes()).with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(tickers::routes())
        .merge(candles::routes())
        .merge(products::routes())
        .merge(alerts::routes())
        .merge(status::routes())
}
