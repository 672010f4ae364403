//! Operator endpoints, served on the admin listener only.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::info;

use crate::{application::repos::HealthRepo, cache::CacheState};

use super::{
    db_health_response,
    middleware::{log_responses, set_request_context},
};

#[derive(Clone)]
pub struct AdminState {
    pub db: Arc<dyn HealthRepo>,
    pub cache: Option<CacheState>,
}

pub fn build_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/_health/db", get(admin_health))
        .route("/cache/invalidate", post(invalidate_cache))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn admin_health(State(state): State<AdminState>) -> Response {
    db_health_response(state.db.health_check().await)
}

/// Drop every cached feed page. Succeeds even when caching is disabled.
async fn invalidate_cache(State(state): State<AdminState>) -> Response {
    let cleared = state
        .cache
        .as_ref()
        .map(|cache| cache.store.invalidate_all())
        .unwrap_or(0);
    info!(
        target = "yatube::http::admin",
        cleared, "response cache cleared"
    );
    StatusCode::NO_CONTENT.into_response()
}
